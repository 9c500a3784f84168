//! Declarative search requests
//!
//! Requests arrive as loosely typed JSON. [`SearchRequest::from_value`] checks
//! the shape required by the selected `type` and produces a tagged variant, so
//! everything downstream works with validated data only.

use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A string-or-integer attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Text(String),
}

impl AttributeValue {
    /// Accepts JSON strings and integral numbers only
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Integer),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Integer coercion used by range filters ("100" and 100 both work)
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One `field^boost` entry of a multi_match request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostedField {
    pub field: String,
    pub boost: i64,
}

impl BoostedField {
    pub fn weighted(&self) -> String {
        format!("{}^{}", self.field, self.boost)
    }
}

/// Range operators accepted by `range_filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOperator {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// Which vector index a k-NN or hybrid query runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorMode {
    OnDisk,
    InMemory,
}

impl VectorMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "on_disk" => Some(Self::OnDisk),
            "in_memory" => Some(Self::InMemory),
            _ => None,
        }
    }
}

/// How a complex search combines its conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexSearchType {
    /// Aggregation-only request; the query is always match-all
    Aggregations,
    /// Fuzzy text matching (AUTO fuzziness)
    Fuzzy,
    /// Exact phrase text matching
    Exact,
    /// OR semantics across field conditions
    Any,
    /// AND semantics across field conditions
    All,
}

impl ComplexSearchType {
    fn parse(s: Option<&str>) -> Self {
        match s {
            Some("aggregations") => Self::Aggregations,
            Some("fuzzy") => Self::Fuzzy,
            Some("exact") => Self::Exact,
            Some("any") => Self::Any,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    Range,
    Number,
}

/// Value carried by a [`FieldSpec`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Nothing usable was supplied; the field contributes no condition
    Empty,
    Scalar(Value),
    Range { min: Option<Value>, max: Option<Value> },
}

/// A per-field condition inside a complex search
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub boost: Option<f64>,
    pub value: FieldValue,
}

#[derive(Deserialize)]
struct RawFieldSpec {
    name: String,
    #[serde(rename = "type")]
    kind: FieldKind,
    #[serde(default)]
    boost: Option<f64>,
    #[serde(default)]
    value: Value,
}

impl FieldSpec {
    fn from_json(value: &Value) -> SearchResult<Self> {
        let raw: RawFieldSpec = serde_json::from_value(value.clone()).map_err(|e| {
            SearchError::InvalidRequest(format!("Invalid request, malformed field spec: {}", e))
        })?;

        let value = match raw.kind {
            FieldKind::Range => match raw.value {
                Value::Null => FieldValue::Empty,
                Value::Object(bounds) => {
                    let min = bound(&bounds, "min");
                    let max = bound(&bounds, "max");
                    if min.is_none() && max.is_none() {
                        FieldValue::Empty
                    } else {
                        FieldValue::Range { min, max }
                    }
                }
                _ => {
                    return Err(SearchError::InvalidRequest(format!(
                        "Invalid request, range field {} requires a value object with min or max",
                        raw.name
                    )))
                }
            },
            _ => match raw.value {
                Value::Null => FieldValue::Empty,
                Value::String(s) if s.is_empty() => FieldValue::Empty,
                other => FieldValue::Scalar(other),
            },
        };

        Ok(Self {
            name: raw.name,
            kind: raw.kind,
            boost: raw.boost,
            value,
        })
    }
}

fn bound(bounds: &Map<String, Value>, key: &str) -> Option<Value> {
    match bounds.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v.clone()),
    }
}

/// One requested aggregation. Entries without `type` or `field` are kept
/// here and skipped by the builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    #[serde(rename = "type", default)]
    pub agg_type: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub ranges: Option<Vec<Value>>,
    #[serde(default)]
    pub metric_field: Option<String>,
    #[serde(default)]
    pub metric_type: Option<String>,
    #[serde(default)]
    pub metric_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSearch {
    pub search_value: Option<String>,
    pub search_type: ComplexSearchType,
    pub fields: Vec<FieldSpec>,
    pub aggregations: Vec<AggregationSpec>,
}

/// A validated search request; exactly one kind is active
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    MultiMatch {
        value: AttributeValue,
        fields: Vec<BoostedField>,
    },
    Wildcard {
        attribute: String,
        value: AttributeValue,
        case_insensitive: bool,
    },
    Match {
        attribute: String,
        value: AttributeValue,
        minimum_should_match: Option<AttributeValue>,
    },
    Prefix {
        attribute: String,
        value: AttributeValue,
    },
    Range {
        attribute: String,
        operator: RangeOperator,
        value: i64,
    },
    Complex(ComplexSearch),
    Vector {
        text: String,
        mode: VectorMode,
    },
    Hybrid {
        text: String,
        mode: VectorMode,
    },
    /// Unknown or absent `type`
    MatchAll,
}

impl SearchRequest {
    /// Validate a raw request body
    pub fn from_value(body: &Value) -> SearchResult<Self> {
        let obj = body
            .as_object()
            .ok_or_else(|| invalid("Invalid request"))?;

        let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();

        match kind {
            "multi_match" => {
                let (_, value) = attribute_pair(obj)?;
                let fields = obj
                    .get("fields")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("Invalid request, fields should be a list"))?;
                let fields = fields
                    .iter()
                    .map(|entry| {
                        let field = entry
                            .get("field")
                            .and_then(Value::as_str)
                            .ok_or_else(|| invalid("Invalid request, field should be of type string"))?;
                        let boost = entry
                            .get("boost")
                            .and_then(Value::as_i64)
                            .ok_or_else(|| invalid("Invalid request, boost should be of type integer"))?;
                        Ok(BoostedField {
                            field: field.to_string(),
                            boost,
                        })
                    })
                    .collect::<SearchResult<Vec<_>>>()?;
                Ok(Self::MultiMatch { value, fields })
            }
            "wildcard_match" => {
                let (attribute, value) = attribute_pair(obj)?;
                let case_insensitive = obj.get("case_insensitive").map(truthy).unwrap_or(false);
                Ok(Self::Wildcard {
                    attribute,
                    value,
                    case_insensitive,
                })
            }
            "match" => {
                let (attribute, value) = attribute_pair(obj)?;
                let minimum_should_match = match obj.get("minimum_should_match") {
                    None => None,
                    Some(raw) => Some(AttributeValue::from_json(raw).ok_or_else(|| {
                        invalid("Invalid request, minimum_should_match should be of type string or integer")
                    })?),
                };
                Ok(Self::Match {
                    attribute,
                    value,
                    minimum_should_match,
                })
            }
            "prefix_match" => {
                let (attribute, value) = attribute_pair(obj)?;
                Ok(Self::Prefix { attribute, value })
            }
            "range_filter" => {
                let (attribute, value) = attribute_pair(obj)?;
                let operator = obj
                    .get("operator")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid("Invalid request, operator should be of type string"))?;
                let operator = RangeOperator::parse(operator).ok_or_else(|| {
                    invalid("Invalid request, operator should be one of gt, gte, lt, lte")
                })?;
                let value = value.as_integer().ok_or_else(|| {
                    invalid("Invalid request, attribute_value should be an integer for range_filter")
                })?;
                Ok(Self::Range {
                    attribute,
                    operator,
                    value,
                })
            }
            "complex_search" => Ok(Self::Complex(complex_search(obj)?)),
            "vector_search" | "hybrid_search" => {
                let value = obj
                    .get("attribute_value")
                    .and_then(AttributeValue::from_json)
                    .ok_or_else(|| {
                        invalid("Invalid request, attribute_value should be of type string or integer")
                    })?;
                let mode = obj
                    .get("mode")
                    .and_then(Value::as_str)
                    .and_then(VectorMode::parse)
                    .ok_or_else(|| invalid("Invalid request, mode should be one of on_disk, in_memory"))?;
                let text = value.to_string();
                if kind == "vector_search" {
                    Ok(Self::Vector { text, mode })
                } else {
                    Ok(Self::Hybrid { text, mode })
                }
            }
            _ => Ok(Self::MatchAll),
        }
    }

    /// Text that must be embedded before the query can be built
    pub fn embedding_text(&self) -> Option<&str> {
        match self {
            Self::Vector { text, .. } | Self::Hybrid { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Short name used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MultiMatch { .. } => "multi_match",
            Self::Wildcard { .. } => "wildcard_match",
            Self::Match { .. } => "match",
            Self::Prefix { .. } => "prefix_match",
            Self::Range { .. } => "range_filter",
            Self::Complex(_) => "complex_search",
            Self::Vector { .. } => "vector_search",
            Self::Hybrid { .. } => "hybrid_search",
            Self::MatchAll => "match_all",
        }
    }
}

fn invalid(msg: &str) -> SearchError {
    SearchError::InvalidRequest(msg.to_string())
}

fn attribute_pair(obj: &Map<String, Value>) -> SearchResult<(String, AttributeValue)> {
    let name = obj
        .get("attribute_name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("Invalid request, attribute_name should be of type string"))?;
    let value = obj
        .get("attribute_value")
        .and_then(AttributeValue::from_json)
        .ok_or_else(|| {
            invalid("Invalid request, attribute_value should be of type string or integer")
        })?;
    Ok((name.to_string(), value))
}

// Loose boolean coercion for flags sent by form-driven clients
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

fn complex_search(obj: &Map<String, Value>) -> SearchResult<ComplexSearch> {
    let search_type = ComplexSearchType::parse(obj.get("search_type").and_then(Value::as_str));

    let search_value = match obj.get("search_value") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(invalid("Invalid request, search_value should be of type string")),
    };

    let fields = match obj.get("fields") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(FieldSpec::from_json)
            .collect::<SearchResult<Vec<_>>>()?,
        Some(_) => return Err(invalid("Invalid request, fields should be a list")),
    };

    let aggregations = match obj.get("aggregations") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value::<Vec<AggregationSpec>>(value.clone()).map_err(|e| {
            SearchError::InvalidRequest(format!("Invalid request, malformed aggregations: {}", e))
        })?,
    };

    Ok(ComplexSearch {
        search_value,
        search_type,
        fields,
        aggregations,
    })
}
