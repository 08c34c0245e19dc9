//! OpenSearch query builders and response parsing.
//!
//! This module translates a `DocumentQuery` into an OpenSearch search body under the ranking
//! rules of its index, and parses search responses back into a `QueryResult`.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use video_search_shared::FacetDistribution;

use crate::errors::DocumentStoreError;
use crate::opensearch::index_config::searchable_field_path;
use crate::types::{DocumentQuery, Filter, IndexSettings, QueryResult, SortKey, SortOrder};

/// Maximum number of distinct values returned per facet.
pub const MAX_FACET_VALUES: usize = 1000;

/// Build a search body for `query` against an index configured with `settings`.
pub fn build_search_body(settings: &IndexSettings, query: &DocumentQuery) -> Value {
    let text = query.relevance_text();

    let mut body = Map::new();
    body.insert("from".to_string(), json!(query.offset));
    body.insert("size".to_string(), json!(query.limit));
    body.insert("track_total_hits".to_string(), json!(true));
    body.insert("query".to_string(), build_bool_query(settings, text, &query.filters));

    let sort = build_sort(settings, text.is_some(), query);
    if !sort.is_empty() {
        body.insert("sort".to_string(), Value::Array(sort));
    }

    if !query.facets.is_empty() {
        let mut aggs = Map::new();
        for facet in &query.facets {
            aggs.insert(
                facet.clone(),
                json!({ "terms": { "field": facet, "size": MAX_FACET_VALUES } }),
            );
        }
        body.insert("aggs".to_string(), Value::Object(aggs));
    }

    Value::Object(body)
}

/// Build the `bool` query holding the relevance clause and the filters.
fn build_bool_query(settings: &IndexSettings, text: Option<&str>, filters: &[Filter]) -> Value {
    let mut filter_clauses = Vec::new();
    let mut must_not_clauses = Vec::new();

    for filter in filters {
        match filter {
            Filter::Equals { field, value } => {
                filter_clauses.push(json!({ "term": { field.as_str(): value } }));
            }
            Filter::NotEquals { field, value } => {
                must_not_clauses.push(json!({ "term": { field.as_str(): value } }));
            }
            Filter::In { field, values } => {
                filter_clauses.push(json!({ "terms": { field.as_str(): values } }));
            }
        }
    }

    let mut bool_query = Map::new();
    if let Some(text) = text {
        bool_query.insert(
            "must".to_string(),
            json!([build_text_query(settings, text)]),
        );
    }
    if !filter_clauses.is_empty() {
        bool_query.insert("filter".to_string(), Value::Array(filter_clauses));
    }
    if !must_not_clauses.is_empty() {
        bool_query.insert("must_not".to_string(), Value::Array(must_not_clauses));
    }

    if bool_query.is_empty() {
        return json!({ "match_all": {} });
    }
    json!({ "bool": bool_query })
}

/// Build the relevance clause over the searchable attributes.
///
/// Attributes earlier in the searchable list get a higher boost. Every term must match
/// somewhere, fuzziness tolerates typos and the last term matches as a prefix.
pub fn build_text_query(settings: &IndexSettings, text: &str) -> Value {
    let count = settings.searchable.len();
    let fields: Vec<String> = settings
        .searchable
        .iter()
        .enumerate()
        .map(|(position, attribute)| {
            format!(
                "{}^{}",
                searchable_field_path(settings, attribute),
                count - position
            )
        })
        .collect();

    json!({
        "bool": {
            "should": [
                {
                    "multi_match": {
                        "query": text,
                        "fields": fields,
                        "type": "best_fields",
                        "operator": "and",
                        "fuzziness": "AUTO"
                    }
                },
                {
                    // Exact phrase matches rank above scattered terms
                    "multi_match": {
                        "query": text,
                        "fields": fields,
                        "type": "phrase_prefix",
                        "boost": 2.0
                    }
                }
            ],
            "minimum_should_match": 1
        }
    })
}

/// Build the sort clauses. Fields without a mapping are skipped, since OpenSearch rejects a
/// sort on an unmapped field.
fn build_sort(settings: &IndexSettings, has_text: bool, query: &DocumentQuery) -> Vec<Value> {
    settings
        .sort_plan(has_text, &query.sort)
        .into_iter()
        .filter_map(|key| match key {
            SortKey::Relevance => Some(json!({ "_score": { "order": "desc" } })),
            SortKey::Field(clause) => {
                if settings.field_kind(&clause.field).is_none() {
                    debug!(
                        index = %settings.name,
                        field = %clause.field,
                        "Skipping sort on unmapped field"
                    );
                    return None;
                }
                let order = match clause.order {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                };
                Some(json!({ clause.field.as_str(): { "order": order, "missing": "_last" } }))
            }
        })
        .collect()
}

/// Parse a search response body.
pub fn parse_search_response(
    body: &Value,
    facets: &[String],
) -> Result<QueryResult, DocumentStoreError> {
    let hits_section = body
        .get("hits")
        .ok_or_else(|| DocumentStoreError::parse("search response has no hits section"))?;

    let total = hits_section
        .get("total")
        .and_then(|total| match total {
            Value::Number(n) => n.as_u64(),
            other => other.get("value").and_then(Value::as_u64),
        })
        .ok_or_else(|| DocumentStoreError::parse("search response has no hit total"))?;

    let hits = hits_section
        .get("hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("_source").cloned())
                .collect()
        })
        .unwrap_or_default();

    let mut facet_distribution = FacetDistribution::new();
    for facet in facets {
        let mut counts = BTreeMap::new();
        let buckets = body
            .get("aggregations")
            .and_then(|aggs| aggs.get(facet))
            .and_then(|agg| agg.get("buckets"))
            .and_then(Value::as_array);
        for bucket in buckets.into_iter().flatten() {
            let key = match bucket.get("key") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => continue,
            };
            let count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);
            counts.insert(key, count);
        }
        facet_distribution.insert(facet.clone(), counts);
    }

    Ok(QueryResult {
        hits,
        total,
        facet_distribution,
    })
}
