//! Shared fakes for integration tests
//!
//! In-memory stand-ins for the engine, object store signer and embedding
//! service, recording every call for later assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_search::config::Config;
use catalog_search::embedding::{Embedder, EmbeddingMode};
use catalog_search::engine::{BulkResponse, SearchEngine};
use catalog_search::search::{SearchError, SearchResult};
use catalog_search::storage::UrlSigner;
use catalog_search::AppContext;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A recorded `search` call
#[derive(Debug, Clone)]
pub struct SearchCall {
    pub index: String,
    pub body: Value,
    pub pipeline: Option<String>,
}

/// Engine fake that records calls and answers from canned data
#[derive(Default)]
pub struct RecordingEngine {
    pub searches: Mutex<Vec<SearchCall>>,
    pub bulks: Mutex<Vec<Vec<Value>>>,
    pub created: Mutex<Vec<(String, Value)>>,
    pub deleted: Mutex<Vec<String>>,
    pub pipelines: Mutex<Vec<(String, Value)>>,
    existing: Mutex<HashSet<String>>,
    search_response: Mutex<Value>,
    bulk_error_at: Option<usize>,
    delete_error: Option<String>,
    search_delay: Option<Duration>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            search_response: Mutex::new(json!({"hits": {"total": {"value": 0}, "hits": []}})),
            ..Default::default()
        }
    }

    pub fn with_search_response(self, response: Value) -> Self {
        *self.search_response.lock().unwrap() = response;
        self
    }

    /// Make the `n`th bulk call (0-based) report item errors
    pub fn with_bulk_errors_at(mut self, n: usize) -> Self {
        self.bulk_error_at = Some(n);
        self
    }

    /// Answer searches only after `delay`
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn with_existing_index(self, index: &str) -> Self {
        self.existing.lock().unwrap().insert(index.to_string());
        self
    }

    pub fn with_delete_error(mut self, reason: &str) -> Self {
        self.delete_error = Some(reason.to_string());
        self
    }

    pub fn bulk_calls(&self) -> Vec<Vec<Value>> {
        self.bulks.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.searches.lock().unwrap().clone()
    }

    /// Documents (every second entry) sent to `index` across all bulk calls
    pub fn documents_for(&self, index: &str) -> Vec<Value> {
        self.bulk_calls()
            .iter()
            .flat_map(|entries| entries.chunks(2))
            .filter(|pair| pair[0]["index"]["_index"] == index)
            .map(|pair| pair[1].clone())
            .collect()
    }
}

#[async_trait]
impl SearchEngine for RecordingEngine {
    async fn search(&self, index: &str, body: &Value, pipeline: Option<&str>) -> SearchResult<Value> {
        self.searches.lock().unwrap().push(SearchCall {
            index: index.to_string(),
            body: body.clone(),
            pipeline: pipeline.map(str::to_string),
        });
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.search_response.lock().unwrap().clone())
    }

    async fn bulk(&self, entries: &[Value]) -> SearchResult<BulkResponse> {
        let mut bulks = self.bulks.lock().unwrap();
        let call = bulks.len();
        bulks.push(entries.to_vec());

        let items: Vec<Value> = entries
            .chunks(2)
            .map(|_| json!({"index": {"status": 201}}))
            .collect();
        let errors = self.bulk_error_at == Some(call);
        Ok(BulkResponse::new(json!({"took": 1, "errors": errors, "items": items})))
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        Ok(self.existing.lock().unwrap().contains(index))
    }

    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()> {
        self.existing.lock().unwrap().insert(index.to_string());
        self.created.lock().unwrap().push((index.to_string(), body.clone()));
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> SearchResult<Value> {
        if let Some(reason) = &self.delete_error {
            return Err(SearchError::DeletionFailed(reason.clone()));
        }
        self.existing.lock().unwrap().remove(index);
        self.deleted.lock().unwrap().push(index.to_string());
        Ok(json!({"acknowledged": true}))
    }

    async fn put_search_pipeline(&self, name: &str, body: &Value) -> SearchResult<()> {
        self.pipelines.lock().unwrap().push((name.to_string(), body.clone()));
        Ok(())
    }
}

/// Signer fake; fails for keys containing a configured marker
#[derive(Default)]
pub struct FakeSigner {
    fail_marker: Option<String>,
}

impl FakeSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
        }
    }
}

#[async_trait]
impl UrlSigner for FakeSigner {
    async fn presign_get(&self, key: &str) -> SearchResult<String> {
        if let Some(marker) = &self.fail_marker {
            if key.contains(marker.as_str()) {
                return Err(SearchError::Signing(format!("cannot sign {}", key)));
            }
        }
        Ok(format!("https://bucket.test/{}?X-Amz-Signature=get", key))
    }

    async fn presign_put(&self, key: &str, _content_type: Option<&str>) -> SearchResult<String> {
        Ok(format!("https://bucket.test/{}?X-Amz-Signature=put", key))
    }
}

/// Embedder fake producing vectors derived from text length
pub struct DeterministicEmbedder {
    model_id: String,
    dimension: usize,
    fail_on: Option<String>,
    pub calls: AtomicUsize,
    pub modes: Mutex<Vec<EmbeddingMode>>,
}

impl DeterministicEmbedder {
    pub fn new(model_id: &str, dimension: usize) -> Self {
        Self {
            model_id: model_id.to_string(),
            dimension,
            fail_on: None,
            calls: AtomicUsize::new(0),
            modes: Mutex::new(Vec::new()),
        }
    }

    /// Fail when the embedded text contains `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for DeterministicEmbedder {
    fn default() -> Self {
        Self::new("test-embedder", 4)
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    async fn embed(&self, text: &str, mode: EmbeddingMode) -> SearchResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.modes.lock().unwrap().push(mode);
        if let Some(marker) = &self.fail_on {
            if text.contains(marker.as_str()) {
                return Err(SearchError::Embedding("model unavailable".into()));
            }
        }
        Ok(vec![text.len() as f32; self.dimension])
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// `n` catalog products
pub fn products(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "title": format!("Product {}", i),
                "category": "shoes",
                "description": "Lightweight trail runner",
                "color": "red",
                "price": 100 + i,
                "file_name": format!("{}_product.png", i),
            })
        })
        .collect()
}

/// Config pointing the catalog at `catalog`
pub fn test_config(catalog: Option<PathBuf>) -> Config {
    let mut config = Config::default();
    config.embedding.dimension = 4;
    if let Some(path) = catalog {
        config.indexing.catalog_path = path;
    }
    config
}

pub fn test_context(
    config: Config,
    engine: Arc<RecordingEngine>,
    signer: Arc<FakeSigner>,
    embedder: Arc<DeterministicEmbedder>,
) -> Arc<AppContext> {
    Arc::new(AppContext::new(config, engine, signer, embedder))
}
