//! Query document construction
//!
//! [`QueryBuilder`] turns a validated [`SearchRequest`] into an immutable
//! [`QueryDocument`]. Building is pure: it never talks to the engine, and the
//! embedding vector for k-NN kinds is passed in by the caller.

use crate::search::aggregation::AggregationBuilder;
use crate::search::error::{SearchError, SearchResult};
use crate::search::request::{
    AttributeValue, BoostedField, ComplexSearch, ComplexSearchType, FieldKind, FieldSpec,
    FieldValue, SearchRequest, VectorMode,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Page size applied to every query
pub const PAGE_SIZE: u64 = 100;

/// Neighbours requested from k-NN queries
pub const KNN_K: u64 = 100;

/// Field holding document embeddings
pub const VECTOR_FIELD: &str = "vector_embedding";

/// Default pipeline that normalizes and combines hybrid scores
pub const DEFAULT_SEARCH_PIPELINE: &str = "oss_srch_pipeline";

const PREFIX_MAX_EXPANSIONS: u64 = 10;
const PREFIX_SLOP: u64 = 1;
const COMPLEX_TEXT_FIELDS: [&str; 3] = ["title^3", "description^2", "color^1"];
const HYBRID_TEXT_FIELDS: [&str; 2] = ["title", "description"];

/// Which index a query document targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexTarget {
    /// The keyword (non-vector) index
    Keyword,
    /// One of the vector indices
    Vector(VectorMode),
}

/// Engine-native query, ready to submit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDocument {
    body: Value,
    target: IndexTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<String>,
}

impl QueryDocument {
    fn keyword(query: Value) -> Self {
        Self {
            body: json!({ "size": PAGE_SIZE, "query": query }),
            target: IndexTarget::Keyword,
            pipeline: None,
        }
    }

    /// Full request body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The `query` clause
    pub fn query(&self) -> &Value {
        &self.body["query"]
    }

    pub fn target(&self) -> IndexTarget {
        self.target
    }

    /// Search pipeline the engine should run the query through
    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }
}

/// Builds query documents from search requests
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    search_pipeline: String,
    aggregations: AggregationBuilder,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_PIPELINE)
    }
}

impl QueryBuilder {
    /// Create a builder tagging hybrid queries with `search_pipeline`
    pub fn new(search_pipeline: impl Into<String>) -> Self {
        Self {
            search_pipeline: search_pipeline.into(),
            aggregations: AggregationBuilder,
        }
    }

    /// Build the query document for `request`.
    ///
    /// `embedding` must be supplied for `vector_search` and `hybrid_search`.
    pub fn build(
        &self,
        request: &SearchRequest,
        embedding: Option<&[f32]>,
    ) -> SearchResult<QueryDocument> {
        let document = match request {
            SearchRequest::MultiMatch { value, fields } => QueryDocument::keyword(multi_match(value, fields)),
            SearchRequest::Wildcard {
                attribute,
                value,
                case_insensitive,
            } => QueryDocument::keyword(json!({
                "wildcard": {
                    attribute: {
                        "value": value.to_json(),
                        "case_insensitive": case_insensitive,
                    }
                }
            })),
            SearchRequest::Match {
                attribute,
                value,
                minimum_should_match,
            } => {
                let mut clause = json!({ "query": value.to_json() });
                if let Some(msm) = minimum_should_match {
                    clause["minimum_should_match"] = msm.to_json();
                }
                QueryDocument::keyword(json!({ "match": { attribute: clause } }))
            }
            SearchRequest::Prefix { attribute, value } => {
                if value.is_empty() {
                    QueryDocument::keyword(match_all())
                } else {
                    QueryDocument::keyword(json!({
                        "match_phrase_prefix": {
                            attribute: {
                                "query": value.to_json(),
                                "max_expansions": PREFIX_MAX_EXPANSIONS,
                                "slop": PREFIX_SLOP,
                            }
                        }
                    }))
                }
            }
            SearchRequest::Range {
                attribute,
                operator,
                value,
            } => QueryDocument::keyword(json!({
                "range": { attribute: { operator.as_str(): value } }
            })),
            SearchRequest::Complex(complex) => self.complex(complex)?,
            SearchRequest::Vector { mode, .. } => {
                let vector = require_embedding(embedding)?;
                QueryDocument {
                    body: json!({
                        "size": PAGE_SIZE,
                        "_source": { "excludes": [VECTOR_FIELD] },
                        "query": knn(vector),
                    }),
                    target: IndexTarget::Vector(*mode),
                    pipeline: None,
                }
            }
            SearchRequest::Hybrid { text, mode } => {
                let vector = require_embedding(embedding)?;
                QueryDocument {
                    body: json!({
                        "size": PAGE_SIZE,
                        "_source": { "excludes": [VECTOR_FIELD] },
                        "query": {
                            "hybrid": {
                                "queries": [
                                    {
                                        "multi_match": {
                                            "query": text,
                                            "fields": HYBRID_TEXT_FIELDS,
                                        }
                                    },
                                    knn(vector),
                                ]
                            }
                        },
                    }),
                    target: IndexTarget::Vector(*mode),
                    pipeline: Some(self.search_pipeline.clone()),
                }
            }
            SearchRequest::MatchAll => QueryDocument::keyword(match_all()),
        };

        tracing::debug!(kind = request.kind(), body = %document.body, "Built query document");
        Ok(document)
    }

    fn complex(&self, search: &ComplexSearch) -> SearchResult<QueryDocument> {
        if search.search_type == ComplexSearchType::Aggregations {
            let mut document = QueryDocument::keyword(match_all());
            document.body["aggs"] = Value::Object(self.aggregations.build(&search.aggregations));
            return Ok(document);
        }

        let mut must = Vec::new();
        if let Some(text) = search.search_value.as_deref() {
            must.push(text_condition(text, search.search_type));
        }

        let conditions = search
            .fields
            .iter()
            .filter_map(field_condition)
            .collect::<Vec<_>>();

        let mut bool_query = Map::new();
        if search.search_type == ComplexSearchType::Any && !conditions.is_empty() {
            bool_query.insert("should".into(), Value::Array(conditions));
            bool_query.insert("minimum_should_match".into(), json!(1));
        } else {
            must.extend(conditions);
        }
        if !must.is_empty() {
            bool_query.insert("must".into(), Value::Array(must));
        }

        if bool_query.is_empty() {
            return Ok(QueryDocument::keyword(match_all()));
        }
        Ok(QueryDocument::keyword(json!({ "bool": bool_query })))
    }
}

fn match_all() -> Value {
    json!({ "match_all": {} })
}

fn multi_match(value: &AttributeValue, fields: &[BoostedField]) -> Value {
    let weighted: Vec<String> = fields.iter().map(BoostedField::weighted).collect();
    json!({
        "multi_match": {
            "query": value.to_json(),
            "fields": weighted,
            "type": "phrase_prefix",
        }
    })
}

fn knn(vector: &[f32]) -> Value {
    json!({ "knn": { VECTOR_FIELD: { "vector": vector, "k": KNN_K } } })
}

fn require_embedding(embedding: Option<&[f32]>) -> SearchResult<&[f32]> {
    embedding.ok_or_else(|| {
        SearchError::InvalidRequest("Invalid request, an embedding is required for vector queries".into())
    })
}

fn text_condition(text: &str, search_type: ComplexSearchType) -> Value {
    let mut clause = json!({
        "query": text,
        "fields": COMPLEX_TEXT_FIELDS,
        "type": "best_fields",
    });
    match search_type {
        ComplexSearchType::Fuzzy => {
            clause["fuzziness"] = json!("AUTO");
            clause["prefix_length"] = json!(2);
            clause["fuzzy_transpositions"] = json!(true);
        }
        ComplexSearchType::Exact => clause["type"] = json!("phrase"),
        _ => {}
    }
    json!({ "multi_match": clause })
}

fn field_condition(spec: &FieldSpec) -> Option<Value> {
    let name = spec.name.as_str();
    match (&spec.value, spec.kind) {
        (FieldValue::Empty, _) => None,
        (FieldValue::Range { min, max }, _) => {
            let mut bounds = Map::new();
            if let Some(min) = min {
                bounds.insert("gte".into(), min.clone());
            }
            if let Some(max) = max {
                bounds.insert("lte".into(), max.clone());
            }
            Some(json!({ "range": { name: bounds } }))
        }
        (FieldValue::Scalar(value), FieldKind::Text) => Some(json!({
            "match": { name: { "query": value, "boost": spec.boost.unwrap_or(1.0) } }
        })),
        (FieldValue::Scalar(value), FieldKind::Select) => Some(json!({
            "term": { format!("{}.keyword", name): value }
        })),
        (FieldValue::Scalar(value), FieldKind::Number | FieldKind::Range) => Some(json!({
            "term": { name: value }
        })),
    }
}
