use crate::embedding::{Embedder, EmbeddingMode};
use crate::engine::SearchEngine;
use crate::indexing::bulk::{ensure_objects, flush_entries, new_document_id};
use crate::indexing::{BulkBatch, IndexSummary, DEFAULT_BATCH_DOCUMENTS};
use crate::search::{SearchResult, VectorMode, DEFAULT_SEARCH_PIPELINE, VECTOR_FIELD};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Model whose embeddings ship pre-computed in the catalog
pub const PRE_EMBEDDED_MODEL_ID: &str = "cohere.embed-english-v3";

const DEFAULT_DIMENSION: usize = 1024;

/// Settings and mappings for a k-NN index
pub fn vector_index_body(dimension: usize, mode: VectorMode) -> Value {
    let mut field = json!({
        "type": "knn_vector",
        "dimension": dimension,
        "space_type": "innerproduct",
        "method": {
            "name": "hnsw",
            "engine": "faiss",
        },
    });
    if mode == VectorMode::OnDisk {
        field["mode"] = json!("on_disk");
        field["compression_level"] = json!("32x");
    }

    json!({
        "settings": { "index": { "knn": true } },
        "mappings": { "properties": { VECTOR_FIELD: field } },
    })
}

/// Search pipeline normalizing and combining hybrid sub-query scores
pub fn hybrid_pipeline_body() -> Value {
    json!({
        "description": "Post processor for hybrid search",
        "phase_results_processors": [{
            "normalization-processor": {
                "normalization": { "technique": "min_max" },
                "combination": {
                    "technique": "arithmetic_mean",
                    "parameters": { "weights": [0.3, 0.7] }
                }
            }
        }]
    })
}

/// Writes embedded documents to the on-disk and in-memory k-NN indices
#[derive(Clone)]
pub struct VectorIndexer {
    engine: Arc<dyn SearchEngine>,
    embedder: Arc<dyn Embedder>,
    on_disk_index: String,
    in_memory_index: String,
    pipeline: String,
    dimension: usize,
    max_concurrent: usize,
    batch_documents: usize,
}

impl VectorIndexer {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        embedder: Arc<dyn Embedder>,
        on_disk_index: impl Into<String>,
        in_memory_index: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            embedder,
            on_disk_index: on_disk_index.into(),
            in_memory_index: in_memory_index.into(),
            pipeline: DEFAULT_SEARCH_PIPELINE.to_string(),
            dimension: DEFAULT_DIMENSION,
            max_concurrent: 1,
            batch_documents: DEFAULT_BATCH_DOCUMENTS,
        }
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = pipeline.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Embedding calls allowed in flight at once
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_batch_documents(mut self, batch_documents: usize) -> Self {
        self.batch_documents = batch_documents.max(1);
        self
    }

    fn indices(&self) -> [(&str, VectorMode); 2] {
        [
            (self.on_disk_index.as_str(), VectorMode::OnDisk),
            (self.in_memory_index.as_str(), VectorMode::InMemory),
        ]
    }

    /// Create missing indices and store the hybrid search pipeline
    pub async fn ensure_resources(&self) -> SearchResult<()> {
        for (index, mode) in self.indices() {
            if self.engine.index_exists(index).await? {
                debug!(index, "Vector index already exists");
                continue;
            }
            self.engine
                .create_index(index, &vector_index_body(self.dimension, mode))
                .await?;
        }
        self.engine
            .put_search_pipeline(&self.pipeline, &hybrid_pipeline_body())
            .await
    }

    /// Embed and index every document into both vector indices.
    ///
    /// A document keeps the same id in both indices.
    pub async fn index_all(&self, documents: Vec<Value>) -> SearchResult<IndexSummary> {
        ensure_objects(&documents)?;
        self.ensure_resources().await?;

        let mut summary = IndexSummary::default();
        let mut pending = documents.into_iter().peekable();

        while pending.peek().is_some() {
            let chunk: Vec<Value> = pending.by_ref().take(self.batch_documents).collect();
            let embedded = self.embed_chunk(chunk).await?;

            let mut on_disk = BulkBatch::new(self.batch_documents);
            let mut in_memory = BulkBatch::new(self.batch_documents);
            for document in embedded {
                let id = new_document_id();
                on_disk.push(&self.on_disk_index, &id, document.clone());
                in_memory.push(&self.in_memory_index, &id, document);
            }

            let documents = on_disk.len();
            for (index, batch) in [(&self.on_disk_index, on_disk), (&self.in_memory_index, in_memory)] {
                flush_entries(self.engine.as_ref(), index, batch.entries(), documents).await?;
                summary.flushes += 1;
            }
            summary.documents += documents;
        }

        info!(
            on_disk = %self.on_disk_index,
            in_memory = %self.in_memory_index,
            documents = summary.documents,
            flushes = summary.flushes,
            "Vector indexing completed"
        );
        Ok(summary)
    }

    /// Delete both vector indices
    pub async fn delete_all(&self) -> SearchResult<Vec<Value>> {
        let mut responses = Vec::with_capacity(2);
        for (index, _) in self.indices() {
            responses.push(self.engine.delete_index(index).await?);
        }
        Ok(responses)
    }

    async fn embed_chunk(&self, chunk: Vec<Value>) -> SearchResult<Vec<Value>> {
        stream::iter(chunk)
            .map(|document| self.embed_document(document))
            .buffered(self.max_concurrent)
            .try_collect()
            .await
    }

    async fn embed_document(&self, mut document: Value) -> SearchResult<Value> {
        if !self.needs_embedding(&document) {
            return Ok(document);
        }
        let vector = self
            .embedder
            .embed(&embedding_text(&document), EmbeddingMode::Document)
            .await?;
        document[VECTOR_FIELD] = json!(vector);
        Ok(document)
    }

    fn needs_embedding(&self, document: &Value) -> bool {
        document.get(VECTOR_FIELD).is_none() && self.embedder.model_id() != PRE_EMBEDDED_MODEL_ID
    }
}

/// Text a product is embedded from
pub(crate) fn embedding_text(document: &Value) -> String {
    let field = |name: &str| document.get(name).and_then(Value::as_str).unwrap_or_default();
    format!(
        "{}, Category: {}, Description: {}",
        field("title"),
        field("category"),
        field("description")
    )
}
