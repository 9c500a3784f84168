//! Product catalog search
//!
//! Turns declarative search requests into engine-native query documents and
//! runs them against the configured indices:
//!
//! - **Request validation**: [`SearchRequest::from_value`] checks shape and
//!   types before anything reaches the engine
//! - **Query building**: keyword, prefix, range, complex boolean and k-NN
//!   queries via [`QueryBuilder`]
//! - **Aggregations**: terms, stats, range and nested stats via
//!   [`AggregationBuilder`]
//! - **Execution**: [`SearchService`] embeds vector queries, picks the target
//!   index and enriches hits
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           SearchService                          │
//! │  - parse request   - embed (query mode)          │
//! │  - build query     - enrich hits                 │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │           QueryBuilder / AggregationBuilder      │
//! │  - pure, returns an immutable QueryDocument      │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │           SearchEngine (OpenSearch REST)         │
//! │  - products / products-vector-* indices          │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use catalog_search::search::{QueryBuilder, SearchRequest};
//! use serde_json::json;
//!
//! let request = SearchRequest::from_value(&json!({
//!     "type": "match",
//!     "attribute_name": "category",
//!     "attribute_value": "shoes"
//! }))?;
//! let document = QueryBuilder::default().build(&request, None)?;
//! assert_eq!(document.body()["size"], 100);
//! # Ok::<(), catalog_search::search::SearchError>(())
//! ```

mod aggregation;
mod error;
mod query;
mod request;
mod service;

pub use aggregation::AggregationBuilder;
pub use error::{SearchError, SearchResult};
pub use query::{
    IndexTarget, QueryBuilder, QueryDocument, DEFAULT_SEARCH_PIPELINE, KNN_K, PAGE_SIZE,
    VECTOR_FIELD,
};
pub use request::{
    AggregationSpec, AttributeValue, BoostedField, ComplexSearch, ComplexSearchType, FieldKind,
    FieldSpec, FieldValue, RangeOperator, SearchRequest, VectorMode,
};
pub use service::{IndexNames, SearchService};
