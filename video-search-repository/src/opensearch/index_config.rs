//! OpenSearch index configuration and mappings.
//!
//! Every logical index is backed by a versioned physical index (`videos_v0`) reachable through
//! an alias carrying the logical name (`videos`). All document operations go through the alias,
//! so a new version can be built and swapped in without touching callers.

use serde_json::{json, Map, Value};

use crate::types::{FieldKind, IndexSettings};

/// Sub-field holding the analyzed copy of a searchable keyword field.
pub const TEXT_SUBFIELD: &str = "text";

/// Configuration shared by all indexes managed by a provider.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The version number appended to physical index names (e.g., 0 for "videos_v0").
    pub version: u32,
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

impl IndexConfig {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }

    /// Get the versioned physical index name for a logical index.
    pub fn versioned_index_name(&self, alias: &str) -> String {
        format!("{}_v{}", alias, self.version)
    }

    /// Build the create-index body: settings, mappings and the alias.
    pub fn create_index_body(&self, settings: &IndexSettings) -> Value {
        let mut aliases = Map::new();
        aliases.insert(settings.name.clone(), json!({}));

        json!({
            "settings": {
                "number_of_shards": self.number_of_shards,
                "number_of_replicas": self.number_of_replicas
            },
            "mappings": build_mappings(settings),
            "aliases": aliases
        })
    }
}

/// Get the field path to target with full-text queries for a searchable attribute.
pub fn searchable_field_path(settings: &IndexSettings, attribute: &str) -> String {
    match settings.field_kind(attribute) {
        Some(FieldKind::Text) => attribute.to_string(),
        _ => format!("{}.{}", attribute, TEXT_SUBFIELD),
    }
}

/// Build the mappings for an index, nesting dotted field names under `properties`.
pub fn build_mappings(settings: &IndexSettings) -> Value {
    let mut properties = Map::new();
    for field in &settings.fields {
        let searchable = settings.searchable.iter().any(|s| *s == field.name);
        let mapping = field_mapping(field.kind, searchable);
        insert_property(&mut properties, &field.name, mapping);
    }
    json!({ "properties": properties })
}

fn field_mapping(kind: FieldKind, searchable: bool) -> Value {
    match kind {
        FieldKind::Keyword if searchable => json!({
            "type": "keyword",
            "fields": { TEXT_SUBFIELD: { "type": "text" } }
        }),
        FieldKind::Keyword => json!({ "type": "keyword" }),
        FieldKind::Text => json!({ "type": "text" }),
        FieldKind::Long => json!({ "type": "long" }),
        FieldKind::Date => json!({ "type": "date" }),
        FieldKind::Unindexed => json!({ "type": "keyword", "index": false }),
    }
}

fn insert_property(properties: &mut Map<String, Value>, path: &str, mapping: Value) {
    match path.split_once('.') {
        None => {
            properties.insert(path.to_string(), mapping);
        }
        Some((head, rest)) => {
            let parent = properties
                .entry(head.to_string())
                .or_insert_with(|| json!({ "properties": {} }));
            if let Some(Value::Object(children)) = parent.get_mut("properties") {
                insert_property(children, rest, mapping);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldMapping, RankingRule};

    fn settings() -> IndexSettings {
        IndexSettings {
            name: "videos".to_string(),
            primary_key: "id".to_string(),
            fields: vec![
                FieldMapping::new("id", FieldKind::Keyword),
                FieldMapping::new("title", FieldKind::Text),
                FieldMapping::new("tags", FieldKind::Keyword),
                FieldMapping::new("thumbnailUrl", FieldKind::Unindexed),
                FieldMapping::new("metrics.viewsCount", FieldKind::Long),
                FieldMapping::new("metrics.viewsCountUpdatedAt", FieldKind::Date),
            ],
            searchable: vec!["title".to_string(), "tags".to_string()],
            filterable: vec!["id".to_string(), "tags".to_string()],
            sortable: vec![],
            ranking_rules: vec![RankingRule::Words],
        }
    }

    #[test]
    fn test_versioned_index_name() {
        assert_eq!(IndexConfig::new(0).versioned_index_name("videos"), "videos_v0");
        assert_eq!(IndexConfig::new(3).versioned_index_name("creators"), "creators_v3");
    }

    #[test]
    fn test_mappings_structure() {
        let mappings = build_mappings(&settings());
        let properties = &mappings["properties"];

        assert_eq!(properties["id"]["type"], "keyword");
        assert!(properties["id"].get("fields").is_none());
        assert_eq!(properties["title"]["type"], "text");
        assert_eq!(properties["tags"]["type"], "keyword");
        assert_eq!(properties["tags"]["fields"]["text"]["type"], "text");
        assert_eq!(properties["thumbnailUrl"]["index"], false);
        assert_eq!(
            properties["metrics"]["properties"]["viewsCount"]["type"],
            "long"
        );
        assert_eq!(
            properties["metrics"]["properties"]["viewsCountUpdatedAt"]["type"],
            "date"
        );
    }

    #[test]
    fn test_create_index_body_includes_alias() {
        let body = IndexConfig::new(1).create_index_body(&settings());
        assert!(body["aliases"]["videos"].is_object());
        assert_eq!(body["settings"]["number_of_shards"], 1);
    }

    #[test]
    fn test_searchable_field_path() {
        let settings = settings();
        assert_eq!(searchable_field_path(&settings, "title"), "title");
        assert_eq!(searchable_field_path(&settings, "tags"), "tags.text");
    }
}
