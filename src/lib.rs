//! Product catalog search service
//!
//! Translates HTTP operations into calls against an OpenSearch-compatible
//! engine, an S3 object store and a text embedding service.

pub mod api;
pub mod config;
pub mod context;
pub mod embedding;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod indexing;
pub mod metrics;
pub mod search;
pub mod storage;

pub use context::AppContext;
pub use error::{AppError, Result};
