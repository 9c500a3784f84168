//! Text embedding client
//!
//! Documents and queries are embedded by an external service. The same model
//! is used for both; `mode` lets the service apply its document or query
//! input type.

use crate::config::EmbeddingConfig;
use crate::search::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Which side of the search an embedding is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    Document,
    Query,
}

impl fmt::Display for EmbeddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingMode::Document => write!(f, "document"),
            EmbeddingMode::Query => write!(f, "query"),
        }
    }
}

/// Produces fixed-dimension vectors from text
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    async fn embed(&self, text: &str, mode: EmbeddingMode) -> SearchResult<Vec<f32>>;

    /// Identifier of the model behind this embedder
    fn model_id(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
    mode: EmbeddingMode,
    model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedder backed by an HTTP endpoint
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model_id: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model_id: config.model_id.clone(),
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str, mode: EmbeddingMode) -> SearchResult<Vec<f32>> {
        let request = EmbedRequest {
            text,
            mode,
            model_id: &self.model_id,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Embedding(format!("{}: {}", status, body)));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Embedding(format!("Malformed response: {}", e)))?;

        if body.embedding.len() != self.dimension {
            return Err(SearchError::Embedding(format!(
                "Expected {} dimensions, got {}",
                self.dimension,
                body.embedding.len()
            )));
        }

        debug!(%mode, chars = text.len(), "Text embedded");
        Ok(body.embedding)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
