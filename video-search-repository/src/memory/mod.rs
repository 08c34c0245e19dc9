//! In-memory implementation of the document store.
//!
//! Applies the same filter, sort and facet semantics as the OpenSearch provider over documents
//! held in process memory. Text queries only select matching documents; relevance is left to
//! the real backend. Used by tests and for running the service without a cluster.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use video_search_shared::FacetDistribution;

use crate::errors::DocumentStoreError;
use crate::interfaces::DocumentStore;
use crate::types::{DocumentQuery, Filter, IndexSettings, QueryResult, SortKey, SortOrder};
use crate::utils::{compare_values, facet_key, get_path, merge_json};

#[derive(Debug)]
struct StoredIndex {
    settings: IndexSettings,
    documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct CallCounters {
    gets: AtomicUsize,
    queries: AtomicUsize,
}

/// Document store backed by in-process maps.
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    indexes: Arc<RwLock<HashMap<String, StoredIndex>>>,
    counters: Arc<RwLock<HashMap<String, Arc<CallCounters>>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `query` calls made against `index`.
    pub fn query_count(&self, index: &str) -> usize {
        self.counters_for(index).queries.load(AtomicOrdering::SeqCst)
    }

    /// Number of `get_document` calls made against `index`.
    pub fn get_count(&self, index: &str) -> usize {
        self.counters_for(index).gets.load(AtomicOrdering::SeqCst)
    }

    /// Number of documents stored in `index`.
    pub fn document_count(&self, index: &str) -> usize {
        self.indexes
            .read()
            .map(|indexes| indexes.get(index).map_or(0, |stored| stored.documents.len()))
            .unwrap_or(0)
    }

    fn counters_for(&self, index: &str) -> Arc<CallCounters> {
        if let Ok(counters) = self.counters.read() {
            if let Some(existing) = counters.get(index) {
                return existing.clone();
            }
        }
        match self.counters.write() {
            Ok(mut counters) => counters.entry(index.to_string()).or_default().clone(),
            Err(_) => Arc::new(CallCounters::default()),
        }
    }

    fn with_index<T>(
        &self,
        index: &str,
        f: impl FnOnce(&StoredIndex) -> Result<T, DocumentStoreError>,
    ) -> Result<T, DocumentStoreError> {
        let indexes = self
            .indexes
            .read()
            .map_err(|e| DocumentStoreError::unknown(e.to_string()))?;
        let stored = indexes.get(index).ok_or_else(|| unknown_index(index))?;
        f(stored)
    }

    fn with_index_mut<T>(
        &self,
        index: &str,
        f: impl FnOnce(&mut StoredIndex) -> Result<T, DocumentStoreError>,
    ) -> Result<T, DocumentStoreError> {
        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| DocumentStoreError::unknown(e.to_string()))?;
        let stored = indexes.get_mut(index).ok_or_else(|| unknown_index(index))?;
        f(stored)
    }
}

fn unknown_index(index: &str) -> DocumentStoreError {
    DocumentStoreError::validation(format!("index '{}' has not been provisioned", index))
}

fn ensure_object(document: &Value) -> Result<(), DocumentStoreError> {
    if document.is_object() {
        Ok(())
    } else {
        Err(DocumentStoreError::validation("document must be a JSON object"))
    }
}

/// Returns true if the field value (or any element of an array value) equals `target`.
fn value_matches(value: &Value, target: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| scalar_eq(item, target)),
        other => scalar_eq(other, target),
    }
}

fn scalar_eq(value: &Value, target: &Value) -> bool {
    match (value, target) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::Number(b)) | (Value::Number(b), Value::String(a)) => {
            a.parse::<f64>().ok() == b.as_f64()
        }
        (a, b) => a == b,
    }
}

fn matches_filter(document: &Value, filter: &Filter) -> bool {
    let field_value = get_path(document, filter.field());
    match filter {
        Filter::Equals { value, .. } => field_value.is_some_and(|v| value_matches(v, value)),
        Filter::NotEquals { value, .. } => !field_value.is_some_and(|v| value_matches(v, value)),
        Filter::In { values, .. } => {
            field_value.is_some_and(|v| values.iter().any(|target| value_matches(v, target)))
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn field_tokens(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => tokenize(s),
        Value::Array(items) => items.iter().flat_map(field_tokens).collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// Whether every query term matches a token of some searchable attribute, exactly or, for the
/// last term, as a prefix. Relevance is not scored.
fn matches_text(document: &Value, searchable: &[String], terms: &[String]) -> bool {
    let tokens: Vec<String> = searchable
        .iter()
        .filter_map(|attribute| get_path(document, attribute))
        .flat_map(field_tokens)
        .collect();

    terms.iter().enumerate().all(|(position, term)| {
        let is_last = position + 1 == terms.len();
        tokens
            .iter()
            .any(|token| token == term || (is_last && token.starts_with(term.as_str())))
    })
}

/// Order two documents by the field keys of `plan`. Relevance keys leave the order as is.
fn compare_by_plan(plan: &[SortKey], a_doc: &Value, b_doc: &Value) -> Ordering {
    for key in plan {
        let ordering = match key {
            SortKey::Relevance => Ordering::Equal,
            SortKey::Field(clause) => {
                let a = get_path(a_doc, &clause.field);
                let b = get_path(b_doc, &clause.field);
                match (clause.order, a.is_some() && b.is_some()) {
                    (SortOrder::Desc, true) => compare_values(b, a),
                    _ => compare_values(a, b),
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn facet_counts(documents: &[&Value], facets: &[String]) -> FacetDistribution {
    let mut distribution = FacetDistribution::new();
    for facet in facets {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for document in documents {
            let mut keys: Vec<String> = match get_path(document, facet) {
                Some(Value::Array(items)) => items.iter().filter_map(facet_key).collect(),
                Some(value) => facet_key(value).into_iter().collect(),
                None => Vec::new(),
            };
            keys.sort();
            keys.dedup();
            for key in keys {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        distribution.insert(facet.clone(), counts);
    }
    distribution
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn ensure_index(&self, settings: &IndexSettings) -> Result<(), DocumentStoreError> {
        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| DocumentStoreError::unknown(e.to_string()))?;
        match indexes.get_mut(&settings.name) {
            Some(existing) => existing.settings = settings.clone(),
            None => {
                debug!(index = %settings.name, "Created in-memory index");
                indexes.insert(
                    settings.name.clone(),
                    StoredIndex {
                        settings: settings.clone(),
                        documents: BTreeMap::new(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, DocumentStoreError> {
        self.counters_for(index).gets.fetch_add(1, AtomicOrdering::SeqCst);
        self.with_index(index, |stored| Ok(stored.documents.get(id).cloned()))
    }

    async fn put_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), DocumentStoreError> {
        ensure_object(document)?;
        self.with_index_mut(index, |stored| {
            stored.documents.insert(id.to_string(), document.clone());
            Ok(())
        })
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), DocumentStoreError> {
        ensure_object(document)?;
        self.with_index_mut(index, |stored| {
            if stored.documents.contains_key(id) {
                return Err(DocumentStoreError::document_exists(index, id));
            }
            stored.documents.insert(id.to_string(), document.clone());
            Ok(())
        })
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), DocumentStoreError> {
        ensure_object(partial)?;
        self.with_index_mut(index, |stored| {
            let existing = stored
                .documents
                .get_mut(id)
                .ok_or_else(|| DocumentStoreError::document_not_found(index, id))?;
            merge_json(existing, partial);
            Ok(())
        })
    }

    async fn query(
        &self,
        index: &str,
        query: &DocumentQuery,
    ) -> Result<QueryResult, DocumentStoreError> {
        self.counters_for(index).queries.fetch_add(1, AtomicOrdering::SeqCst);
        self.with_index(index, |stored| {
            let settings = &stored.settings;
            settings.validate_query(query)?;

            let terms = query.relevance_text().map(tokenize).unwrap_or_default();
            let has_text = !terms.is_empty();

            let mut matches: Vec<&Value> = stored
                .documents
                .values()
                .filter(|document| query.filters.iter().all(|f| matches_filter(document, f)))
                .filter(|document| {
                    !has_text || matches_text(document, &settings.searchable, &terms)
                })
                .collect();

            let plan = settings.sort_plan(has_text, &query.sort);
            matches.sort_by(|a, b| compare_by_plan(&plan, a, b));

            let facet_distribution = facet_counts(&matches, &query.facets);
            let total = matches.len() as u64;
            let hits = matches
                .into_iter()
                .skip(query.offset as usize)
                .take(query.limit as usize)
                .cloned()
                .collect();

            Ok(QueryResult {
                hits,
                total,
                facet_distribution,
            })
        })
    }
}
