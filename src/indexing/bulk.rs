use crate::engine::SearchEngine;
use crate::indexing::{BulkBatch, IndexSummary, DEFAULT_BATCH_DOCUMENTS};
use crate::metrics::{BULK_FLUSHES_TOTAL, DOCUMENTS_INDEXED_TOTAL};
use crate::search::{SearchError, SearchResult, VECTOR_FIELD};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Writes documents to the keyword index
#[derive(Clone)]
pub struct BulkIndexer {
    engine: Arc<dyn SearchEngine>,
    index: String,
    batch_documents: usize,
}

impl BulkIndexer {
    pub fn new(engine: Arc<dyn SearchEngine>, index: impl Into<String>) -> Self {
        Self {
            engine,
            index: index.into(),
            batch_documents: DEFAULT_BATCH_DOCUMENTS,
        }
    }

    /// Override the documents-per-request threshold
    pub fn with_batch_documents(mut self, batch_documents: usize) -> Self {
        self.batch_documents = batch_documents.max(1);
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Index every document, each under a fresh id.
    ///
    /// Embeddings are stripped; the keyword index has no vector mapping.
    pub async fn index_all(&self, documents: Vec<Value>) -> SearchResult<IndexSummary> {
        ensure_objects(&documents)?;

        let mut batch = BulkBatch::new(self.batch_documents);
        let mut summary = IndexSummary::default();

        for mut document in documents {
            strip_vector(&mut document);
            batch.push(&self.index, &new_document_id(), document);

            if batch.is_full() {
                summary.documents += self.flush(&mut batch).await?;
                summary.flushes += 1;
            }
        }

        if !batch.is_empty() {
            summary.documents += self.flush(&mut batch).await?;
            summary.flushes += 1;
        }

        info!(
            index = %self.index,
            documents = summary.documents,
            flushes = summary.flushes,
            "Bulk indexing completed"
        );
        Ok(summary)
    }

    async fn flush(&self, batch: &mut BulkBatch) -> SearchResult<usize> {
        let documents = batch.len();
        let entries = batch.take();
        flush_entries(self.engine.as_ref(), &self.index, &entries, documents).await?;
        Ok(documents)
    }
}

/// Send one bulk request and fail on any item error
pub(crate) async fn flush_entries(
    engine: &dyn SearchEngine,
    index: &str,
    entries: &[Value],
    documents: usize,
) -> SearchResult<()> {
    debug!(index, documents, "Flushing bulk batch");
    let response = engine.bulk(entries).await?;
    BULK_FLUSHES_TOTAL.with_label_values(&[index]).inc();

    if response.has_errors() {
        error!(index, items = response.item_count(), "Bulk response reported item errors");
        return Err(SearchError::BulkItemErrors(response.raw().to_string()));
    }

    DOCUMENTS_INDEXED_TOTAL
        .with_label_values(&[index])
        .inc_by(documents as u64);
    Ok(())
}

pub(crate) fn ensure_objects(documents: &[Value]) -> SearchResult<()> {
    match documents.iter().position(|doc| !doc.is_object()) {
        Some(position) => Err(SearchError::InvalidRequest(format!(
            "Invalid request, document at position {} should be a JSON object",
            position
        ))),
        None => Ok(()),
    }
}

pub(crate) fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn strip_vector(document: &mut Value) {
    if let Some(fields) = document.as_object_mut() {
        fields.remove(VECTOR_FIELD);
    }
}
