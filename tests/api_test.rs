//! End-to-end router tests against in-memory fakes

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use catalog_search::api::{build_router, AppState};
use common::{products, test_config, test_context, DeterministicEmbedder, FakeSigner, RecordingEngine};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    router: Router,
    engine: Arc<RecordingEngine>,
    embedder: Arc<DeterministicEmbedder>,
    _catalog: tempfile::NamedTempFile,
}

fn harness_with(engine: RecordingEngine, catalog: &[Value]) -> Harness {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", Value::Array(catalog.to_vec())).unwrap();

    let engine = Arc::new(engine);
    let embedder = Arc::new(DeterministicEmbedder::default());
    let context = test_context(
        test_config(Some(file.path().to_path_buf())),
        engine.clone(),
        Arc::new(FakeSigner::new()),
        embedder.clone(),
    );

    Harness {
        router: build_router(AppState::new(context)),
        engine,
        embedder,
        _catalog: file,
    }
}

fn harness() -> Harness {
    harness_with(RecordingEngine::new(), &products(3))
}

async fn call(router: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_search_returns_enriched_engine_response() {
    let engine = RecordingEngine::new().with_search_response(json!({
        "hits": {"total": {"value": 1}, "hits": [
            {"_id": "1", "_source": {"title": "Shoe", "file_name": "1_shoe.png"}}
        ]}
    }));
    let h = harness_with(engine, &products(1));

    let (status, body) = call(
        &h.router,
        Method::POST,
        "/search",
        Some(json!({"type": "match", "attribute_name": "category", "attribute_value": "shoes"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], "200");
    assert_eq!(
        body["result"]["hits"]["hits"][0]["_source"]["image_url"],
        "https://bucket.test/images/1_shoe.png?X-Amz-Signature=get"
    );

    let searches = h.engine.search_calls();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].index, "products");
    assert_eq!(
        searches[0].body,
        json!({"size": 100, "query": {"match": {"category": {"query": "shoes"}}}})
    );
}

#[tokio::test]
async fn test_validation_error_never_reaches_engine() {
    let h = harness();

    let (status, body) = call(
        &h.router,
        Method::POST,
        "/search",
        Some(json!({"type": "range_filter", "attribute_name": "price", "attribute_value": 10, "operator": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], "400");
    assert!(body["errorMessage"].as_str().unwrap().contains("operator"));
    assert!(h.engine.search_calls().is_empty());
}

#[tokio::test]
async fn test_hybrid_search_embeds_query_and_uses_pipeline() {
    let h = harness();

    let (status, _) = call(
        &h.router,
        Method::POST,
        "/search",
        Some(json!({"type": "hybrid_search", "attribute_value": "red shoe", "mode": "in_memory"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.embedder.call_count(), 1);

    let searches = h.engine.search_calls();
    assert_eq!(searches[0].index, "products-vector-in-memory");
    assert_eq!(searches[0].pipeline.as_deref(), Some("oss_srch_pipeline"));
}

#[tokio::test]
async fn test_index_catalog() {
    let h = harness();

    let (status, body) = call(&h.router, Method::POST, "/index", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Products indexed successfully");
    assert_eq!(h.engine.documents_for("products").len(), 3);
}

#[tokio::test]
async fn test_index_empty_catalog() {
    let h = harness_with(RecordingEngine::new(), &[]);

    let (status, body) = call(&h.router, Method::POST, "/index", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errorMessage"], "No products to index");
    assert_eq!(body["statusCode"], "500");
}

#[tokio::test]
async fn test_index_custom_documents() {
    let h = harness();

    let (status, _) = call(
        &h.router,
        Method::POST,
        "/index-custom-document",
        Some(json!([{"title": "Acer Aspire 5", "price": 299.99}])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.engine.documents_for("products")[0]["title"], "Acer Aspire 5");

    let (status, body) = call(
        &h.router,
        Method::POST,
        "/index-custom-document",
        Some(json!({"title": "not a list"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_bulk_errors_surface_engine_text() {
    let h = harness_with(RecordingEngine::new().with_bulk_errors_at(0), &products(2));

    let (status, body) = call(&h.router, Method::POST, "/index", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["errorMessage"]
        .as_str()
        .unwrap()
        .contains("Bulk indexing errors"));
}

#[tokio::test]
async fn test_delete_index() {
    let h = harness();
    let (status, body) = call(&h.router, Method::DELETE, "/index", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Index deleted successfully");
    assert_eq!(h.engine.deleted.lock().unwrap().clone(), vec!["products".to_string()]);

    let h = harness_with(
        RecordingEngine::new().with_delete_error("no such index [products]"),
        &products(1),
    );
    let (status, body) = call(&h.router, Method::DELETE, "/index", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errorMessage"], "Error deleting index. no such index [products]");
}

#[tokio::test]
async fn test_vectorize_and_delete_vector_indices() {
    let h = harness();

    let (status, _) = call(&h.router, Method::POST, "/vectorize-index", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.engine.documents_for("products-vector-on-disk").len(), 3);
    assert_eq!(h.engine.documents_for("products-vector-in-memory").len(), 3);

    let (status, _) = call(&h.router, Method::DELETE, "/vectorize-index", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.engine.deleted.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_presigned_url() {
    let h = harness();

    let (status, body) = call(
        &h.router,
        Method::POST,
        "/presigned-url",
        Some(json!({"filename": "shoe.png", "contentType": "image/png"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let result = &body["result"];
    let key = result["key"].as_str().unwrap();
    assert!(key.starts_with("images/") && key.ends_with("_shoe.png"));
    assert_eq!(format!("images/{}", result["file_name"].as_str().unwrap()), key);
    assert!(result["url"].as_str().unwrap().contains("X-Amz-Signature=put"));

    let (status, _) = call(&h.router, Method::POST, "/presigned-url", Some(json!({"filename": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_operation_is_not_supported() {
    let h = harness();

    for (method, path) in [(Method::GET, "/search"), (Method::POST, "/reindex"), (Method::PUT, "/index")] {
        let (status, body) = call(&h.router, method, path, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["errorMessage"], "api_not_supported");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_invalid_json_body() {
    let h = harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/search")
        .body(Body::from("{not json"))
        .unwrap();

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let h = harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/search")
        .header("origin", "https://shop.example")
        .body(Body::from("{}"))
        .unwrap();

    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, body) = call(&h.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_slow_operation_times_out_with_envelope() {
    let mut config = test_config(None);
    config.server.request_timeout_secs = 1;
    let engine = Arc::new(RecordingEngine::new().with_search_delay(std::time::Duration::from_secs(3)));
    let context = test_context(
        config,
        engine.clone(),
        Arc::new(FakeSigner::new()),
        Arc::new(DeterministicEmbedder::default()),
    );
    let router = build_router(AppState::new(context));

    let (status, body) = call(
        &router,
        Method::POST,
        "/search",
        Some(json!({"type": "match", "attribute_name": "category", "attribute_value": "shoes"})),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], "504");
    assert!(body["errorMessage"].as_str().unwrap().contains("search"));
    assert_eq!(engine.search_calls().len(), 1);
}

#[tokio::test]
async fn test_handlers_run_on_spawned_tasks() {
    let h = harness();
    let router = h.router.clone();

    let (status, body) = tokio::spawn(async move {
        call(
            &router,
            Method::POST,
            "/search",
            Some(json!({"type": "prefix_match", "attribute_name": "title", "attribute_value": "Pro"})),
        )
        .await
    })
    .await
    .unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}
