//! Bulk indexing of product documents
//!
//! - [`BulkIndexer`] writes documents to the keyword index in fixed-size
//!   `_bulk` batches
//! - [`VectorIndexer`] embeds documents and writes them to both k-NN indices,
//!   creating the indices and the hybrid search pipeline on first use
//! - [`load_catalog`] reads the product catalog file both indexers start from
//!
//! A batch is flushed as soon as it holds `batch_documents` documents (500 by
//! default); whatever remains is flushed at the end. The first bulk response
//! reporting item errors aborts the run. Batches flushed before that point
//! stay indexed.

mod batch;
mod bulk;
mod catalog;
mod vector;

pub use batch::BulkBatch;
pub use bulk::BulkIndexer;
pub use catalog::load_catalog;
pub use vector::{hybrid_pipeline_body, vector_index_body, VectorIndexer, PRE_EMBEDDED_MODEL_ID};

/// Documents per bulk request
pub const DEFAULT_BATCH_DOCUMENTS: usize = 500;

/// Outcome of an indexing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Documents accepted by the engine
    pub documents: usize,
    /// Bulk requests sent
    pub flushes: usize,
}
