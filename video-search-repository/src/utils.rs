//! Utility functions for working with JSON documents.

use chrono::DateTime;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Resolve a dotted path such as `metrics.viewsCount` inside a document.
pub fn get_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

/// Recursively merge `patch` into `target`.
///
/// Objects are merged key by key; any other value in `patch` replaces the target value.
pub fn merge_json(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            merge_maps(target_map, patch_map);
        }
        (target, patch) => {
            *target = patch.clone();
        }
    }
}

fn merge_maps(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, patch_value) in patch {
        match target.get_mut(key) {
            Some(existing) if existing.is_object() && patch_value.is_object() => {
                merge_json(existing, patch_value);
            }
            _ => {
                target.insert(key.clone(), patch_value.clone());
            }
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
    Bool(bool),
}

fn sort_value(value: &Value) -> Option<SortValue<'_>> {
    match value {
        Value::Number(n) => n.as_f64().map(SortValue::Number),
        Value::String(s) => {
            if let Ok(n) = s.parse::<u64>() {
                Some(SortValue::Number(n as f64))
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                Some(SortValue::Number(ts.timestamp_millis() as f64))
            } else {
                Some(SortValue::Text(s))
            }
        }
        Value::Bool(b) => Some(SortValue::Bool(*b)),
        _ => None,
    }
}

/// Compare two optional field values for sorting in ascending order.
///
/// Decimal strings compare as numbers and RFC 3339 strings as instants, so string-encoded
/// counters and timestamps order naturally. Missing or unsortable values compare greater
/// than any present value.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.and_then(sort_value);
    let b = b.and_then(sort_value);
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Render a scalar as the string used for facet keys.
pub fn facet_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
