use crate::enrichment::enrichers::{DerivedFields, HitEnricher};
use crate::metrics::ENRICHMENT_FAILURES_TOTAL;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Counters for one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Hits inspected
    pub hits: usize,
    /// Hits that received at least one derived field
    pub enriched: usize,
    /// Enricher calls that failed or timed out
    pub failed: usize,
    pub duration_ms: u64,
}

/// Runs registered enrichers over the hits of a raw engine response.
///
/// Failures are logged and skipped; the hit keeps its original fields.
#[derive(Clone)]
pub struct ResultEnricher {
    enrichers: Vec<Arc<dyn HitEnricher>>,
    timeout: Duration,
    max_concurrent: usize,
}

impl Default for ResultEnricher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultEnricher {
    pub fn new() -> Self {
        Self {
            enrichers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Register an enricher
    pub fn with_enricher(mut self, enricher: Arc<dyn HitEnricher>) -> Self {
        debug!("Registered enricher: {}", enricher.name());
        self.enrichers.push(enricher);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Enrich `hits.hits[]._source` in place
    pub async fn enrich(&self, response: &mut Value) -> EnrichmentStats {
        let start = Instant::now();
        let mut stats = EnrichmentStats::default();

        let Some(hits) = response
            .pointer_mut("/hits/hits")
            .and_then(Value::as_array_mut)
        else {
            return stats;
        };
        stats.hits = hits.len();
        if self.enrichers.is_empty() || hits.is_empty() {
            return stats;
        }

        let sources: Vec<Value> = hits
            .iter()
            .map(|hit| hit.get("_source").cloned().unwrap_or(Value::Null))
            .collect();

        let derived: Vec<(DerivedFields, usize)> = stream::iter(sources)
            .map(|source| {
                let enrichers = self.enrichers.clone();
                let limit = self.timeout;
                async move { derive(&enrichers, limit, &source).await }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        for (hit, (fields, failures)) in hits.iter_mut().zip(derived) {
            stats.failed += failures;
            if fields.is_empty() {
                continue;
            }
            if let Some(source) = hit.get_mut("_source").and_then(Value::as_object_mut) {
                source.extend(fields);
                stats.enriched += 1;
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            hits = stats.hits,
            enriched = stats.enriched,
            failed = stats.failed,
            duration_ms = stats.duration_ms,
            "Enrichment completed"
        );
        stats
    }
}

/// Run every enricher over one source, returning merged fields and failure count
async fn derive(
    enrichers: &[Arc<dyn HitEnricher>],
    limit: Duration,
    source: &Value,
) -> (DerivedFields, usize) {
    let mut merged = DerivedFields::new();
    let mut failures = 0;
    if !source.is_object() {
        return (merged, failures);
    }

    for enricher in enrichers {
        match timeout(limit, enricher.enrich(source)).await {
            Ok(Ok(fields)) => merged.extend(fields),
            Ok(Err(e)) => {
                failures += 1;
                ENRICHMENT_FAILURES_TOTAL.inc();
                warn!(enricher = enricher.name(), error = %e, "Enricher failed");
            }
            Err(_) => {
                failures += 1;
                ENRICHMENT_FAILURES_TOTAL.inc();
                warn!(
                    enricher = enricher.name(),
                    timeout_ms = limit.as_millis() as u64,
                    "Enricher timed out"
                );
            }
        }
    }
    (merged, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchError, SearchResult};
    use async_trait::async_trait;
    use serde_json::json;

    struct TitleLength;

    #[async_trait]
    impl HitEnricher for TitleLength {
        fn name(&self) -> &str {
            "title_length"
        }

        async fn enrich(&self, source: &Value) -> SearchResult<DerivedFields> {
            let title = source
                .get("title")
                .and_then(Value::as_str)
                .ok_or_else(|| SearchError::Signing("no title".into()))?;
            let mut fields = DerivedFields::new();
            fields.insert("title_length".into(), json!(title.len()));
            Ok(fields)
        }
    }

    #[tokio::test]
    async fn test_no_hits_section_is_a_no_op() {
        let enricher = ResultEnricher::new().with_enricher(Arc::new(TitleLength));
        let mut response = json!({"aggregations": {}});
        let stats = enricher.enrich(&mut response).await;
        assert_eq!(stats, EnrichmentStats::default());
        assert_eq!(response, json!({"aggregations": {}}));
    }

    #[tokio::test]
    async fn test_failed_hit_does_not_affect_others() {
        let enricher = ResultEnricher::new().with_enricher(Arc::new(TitleLength));
        let mut response = json!({"hits": {"hits": [
            {"_id": "1", "_source": {"title": "Shoe"}},
            {"_id": "2", "_source": {"color": "red"}},
            {"_id": "3", "_source": {"title": "Boot"}}
        ]}});

        let stats = enricher.enrich(&mut response).await;
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.enriched, 2);
        assert_eq!(stats.failed, 1);

        let hits = response["hits"]["hits"].as_array().unwrap();
        assert_eq!(hits[0]["_source"]["title_length"], 4);
        assert_eq!(hits[1]["_source"], json!({"color": "red"}));
        assert_eq!(hits[2]["_source"]["title_length"], 4);
    }
}
