//! Prometheus exposition through the router

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
};
use catalog_search::api::{build_router, AppState};
use catalog_search::metrics::{init_metrics, OPERATIONS_TOTAL};
use common::{test_config, test_context, DeterministicEmbedder, FakeSigner, RecordingEngine};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Group exposition lines by metric family
fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            if let Some(name) = line.split_whitespace().nth(2) {
                current_metric = name.to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }
    metrics
}

#[tokio::test]
async fn test_operations_are_counted_and_exposed() {
    // Registration is process-wide; another test may have done it already
    let _ = init_metrics();
    let before = OPERATIONS_TOTAL.with_label_values(&["search", "success"]).get();

    let context = test_context(
        test_config(None),
        Arc::new(RecordingEngine::new()),
        Arc::new(FakeSigner::new()),
        Arc::new(DeterministicEmbedder::default()),
    );
    let router = build_router(AppState::new(context));

    let search = Request::builder()
        .method(Method::POST)
        .uri("/search")
        .body(Body::from(r#"{"type": "prefix_match", "attribute_name": "title", "attribute_value": ""}"#))
        .unwrap();
    let response = router.clone().oneshot(search).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        OPERATIONS_TOTAL.with_label_values(&["search", "success"]).get(),
        before + 1.0
    );

    let scrape = Request::builder()
        .method(Method::GET)
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(scrape).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let output = String::from_utf8(bytes.to_vec()).unwrap();
    let families = parse_prometheus_output(&output);

    let operations = families
        .get("catalog_search_operations_total")
        .expect("operations counter exposed");
    assert!(operations
        .iter()
        .any(|line| line.contains(r#"operation="search""#) && line.contains(r#"outcome="success""#)));
}
