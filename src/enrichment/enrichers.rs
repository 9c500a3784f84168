use crate::search::SearchResult;
use crate::storage::{retrieval_key, UrlSigner};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fields an enricher derived for one hit
pub type DerivedFields = Map<String, Value>;

/// Derives extra fields for a hit's `_source`
#[async_trait]
pub trait HitEnricher: Send + Sync + 'static {
    /// Get enricher name
    fn name(&self) -> &str;

    /// Derive fields from `source`; an empty map means nothing applies
    async fn enrich(&self, source: &Value) -> SearchResult<DerivedFields>;
}

/// Attaches a presigned `image_url` to hits carrying a `file_name`
pub struct ImageUrlEnricher {
    signer: Arc<dyn UrlSigner>,
}

impl ImageUrlEnricher {
    pub fn new(signer: Arc<dyn UrlSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl HitEnricher for ImageUrlEnricher {
    fn name(&self) -> &str {
        "image_url"
    }

    async fn enrich(&self, source: &Value) -> SearchResult<DerivedFields> {
        let mut derived = DerivedFields::new();
        let Some(file_name) = source.get("file_name").and_then(Value::as_str) else {
            return Ok(derived);
        };

        let url = self.signer.presign_get(&retrieval_key(file_name)).await?;
        derived.insert("image_url".to_string(), Value::String(url));
        Ok(derived)
    }
}
