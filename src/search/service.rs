//! Search execution

use crate::config::EngineConfig;
use crate::embedding::{Embedder, EmbeddingMode};
use crate::engine::SearchEngine;
use crate::enrichment::ResultEnricher;
use crate::search::error::SearchResult;
use crate::search::query::{IndexTarget, QueryBuilder};
use crate::search::request::{SearchRequest, VectorMode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Names of the indices searches can target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNames {
    pub keyword: String,
    pub on_disk: String,
    pub in_memory: String,
}

impl IndexNames {
    pub fn resolve(&self, target: IndexTarget) -> &str {
        match target {
            IndexTarget::Keyword => &self.keyword,
            IndexTarget::Vector(VectorMode::OnDisk) => &self.on_disk,
            IndexTarget::Vector(VectorMode::InMemory) => &self.in_memory,
        }
    }
}

impl From<&EngineConfig> for IndexNames {
    fn from(config: &EngineConfig) -> Self {
        Self {
            keyword: config.index_name.clone(),
            on_disk: config.on_disk_index.clone(),
            in_memory: config.in_memory_index.clone(),
        }
    }
}

/// Runs search requests end to end
#[derive(Clone)]
pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
    embedder: Arc<dyn Embedder>,
    enricher: ResultEnricher,
    builder: QueryBuilder,
    indices: IndexNames,
}

impl SearchService {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        embedder: Arc<dyn Embedder>,
        enricher: ResultEnricher,
        builder: QueryBuilder,
        indices: IndexNames,
    ) -> Self {
        Self {
            engine,
            embedder,
            enricher,
            builder,
            indices,
        }
    }

    /// Validate, build and execute a raw search request.
    ///
    /// Returns the engine response with enriched hits.
    pub async fn search(&self, body: &Value) -> SearchResult<Value> {
        let start = Instant::now();
        let request = SearchRequest::from_value(body)?;

        let embedding = match request.embedding_text() {
            Some(text) => Some(self.embedder.embed(text, EmbeddingMode::Query).await?),
            None => None,
        };

        let document = self.builder.build(&request, embedding.as_deref())?;
        let index = self.indices.resolve(document.target());
        debug!(kind = request.kind(), index, "Executing search");

        let mut response = self
            .engine
            .search(index, document.body(), document.pipeline())
            .await?;
        let stats = self.enricher.enrich(&mut response).await;

        info!(
            kind = request.kind(),
            index,
            hits = stats.hits,
            enriched = stats.enriched,
            duration_ms = start.elapsed().as_millis() as u64,
            "Search completed"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_resolution() {
        let names = IndexNames::from(&EngineConfig::default());
        assert_eq!(names.resolve(IndexTarget::Keyword), "products");
        assert_eq!(
            names.resolve(IndexTarget::Vector(VectorMode::OnDisk)),
            "products-vector-on-disk"
        );
        assert_eq!(
            names.resolve(IndexTarget::Vector(VectorMode::InMemory)),
            "products-vector-in-memory"
        );
    }
}
