//! Aggregation DSL construction

use crate::search::request::AggregationSpec;
use serde_json::{json, Map, Value};

const DEFAULT_BUCKETS: u64 = 10;
const DEFAULT_METRIC_TYPE: &str = "avg";
const DEFAULT_METRIC_NAME: &str = "value";

/// Maps aggregation specs onto the engine's `aggs` object
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationBuilder;

impl AggregationBuilder {
    /// Build the `aggs` object. Specs missing `type` or `field`, unknown
    /// types, range specs without ranges and nested stats without a metric
    /// field are skipped.
    pub fn build(&self, specs: &[AggregationSpec]) -> Map<String, Value> {
        let mut aggs = Map::new();

        for spec in specs {
            let (agg_type, field) = match (spec.agg_type.as_deref(), spec.field.as_deref()) {
                (Some(t), Some(f)) => (t, f),
                _ => {
                    tracing::debug!(?spec, "Skipping aggregation without type or field");
                    continue;
                }
            };

            let body = match agg_type {
                "terms" => Some(terms(field, spec.size)),
                "stats" => Some(json!({ "stats": { "field": field } })),
                "range" => match spec.ranges.as_ref() {
                    Some(ranges) if !ranges.is_empty() => Some(json!({
                        "range": { "field": field, "ranges": ranges }
                    })),
                    _ => None,
                },
                "nested_stats" => spec.metric_field.as_deref().map(|metric_field| {
                    let metric_type = spec.metric_type.as_deref().unwrap_or(DEFAULT_METRIC_TYPE);
                    let metric_name = spec.metric_name.as_deref().unwrap_or(DEFAULT_METRIC_NAME);
                    let mut bucket = terms(field, spec.size);
                    bucket["aggs"] = json!({
                        metric_name: { metric_type: { "field": metric_field } }
                    });
                    bucket
                }),
                _ => None,
            };

            match body {
                Some(body) => {
                    let name = spec
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("{}_{}", field, agg_type));
                    aggs.insert(name, body);
                }
                None => tracing::debug!(agg_type, field, "Skipping incomplete aggregation"),
            }
        }

        aggs
    }
}

fn terms(field: &str, size: Option<u64>) -> Value {
    json!({
        "terms": {
            "field": format!("{}.keyword", field),
            "size": size.unwrap_or(DEFAULT_BUCKETS),
        }
    })
}
