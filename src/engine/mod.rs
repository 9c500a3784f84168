//! Search engine access
//!
//! Everything that talks to the engine goes through the [`SearchEngine`]
//! trait. [`OpenSearchClient`] is the REST implementation used in
//! production; tests substitute in-memory fakes.

mod client;

pub use client::OpenSearchClient;

use crate::search::SearchResult;
use async_trait::async_trait;
use serde_json::Value;

/// Raw response of a `_bulk` call
#[derive(Debug, Clone)]
pub struct BulkResponse {
    raw: Value,
}

impl BulkResponse {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// True when the engine flagged at least one failed item
    pub fn has_errors(&self) -> bool {
        self.raw.get("errors").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Number of per-item results reported
    pub fn item_count(&self) -> usize {
        self.raw
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Operations the service needs from the search engine
#[async_trait]
pub trait SearchEngine: Send + Sync + 'static {
    /// Run a search request against `index`, optionally through a search pipeline
    async fn search(&self, index: &str, body: &Value, pipeline: Option<&str>) -> SearchResult<Value>;

    /// Submit alternating action/document entries as one bulk request
    async fn bulk(&self, entries: &[Value]) -> SearchResult<BulkResponse>;

    /// Check whether `index` exists
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    /// Create `index` with the given settings and mappings
    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()>;

    /// Delete `index`
    async fn delete_index(&self, index: &str) -> SearchResult<Value>;

    /// Create or replace a search pipeline
    async fn put_search_pipeline(&self, name: &str, body: &Value) -> SearchResult<()>;
}
