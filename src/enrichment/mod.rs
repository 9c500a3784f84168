/// Search result enrichment
///
/// This module post-processes raw engine responses:
/// - Pluggable per-hit enrichers deriving extra `_source` fields
/// - Presigned image URLs for hits that reference a stored image
/// - Concurrent, fail-open execution with per-enricher timeouts

pub mod enrichers;
pub mod pipeline;

pub use enrichers::{DerivedFields, HitEnricher, ImageUrlEnricher};
pub use pipeline::{EnrichmentStats, ResultEnricher};
