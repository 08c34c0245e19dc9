//! Request and response types for document store operations.
//!
//! Queries are expressed in a backend-neutral form: a conjunction of filters, an optional
//! relevance text, explicit sort clauses and facet attributes. Each backend translates them
//! and applies the index ranking rules recorded at provisioning time.

use serde_json::Value;

use video_search_shared::FacetDistribution;

use crate::errors::DocumentStoreError;

/// A single filter condition on a (possibly dotted) document field.
///
/// For array-valued fields a condition holds when any element satisfies it.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals { field: String, value: Value },
    NotEquals { field: String, value: Value },
    In { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::NotEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn any_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Equals { field, .. } | Filter::NotEquals { field, .. } | Filter::In { field, .. } => {
                field
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl SortClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// A query against a single index.
///
/// `limit == 0` returns no hits but still reports `total` and facet counts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentQuery {
    /// Relevance text. `None` (or blank) disables the relevance rules.
    pub text: Option<String>,
    /// Conditions that must all hold.
    pub filters: Vec<Filter>,
    pub sort: Vec<SortClause>,
    pub offset: u64,
    pub limit: u64,
    /// Attributes whose value distribution over all matches is returned.
    pub facets: Vec<String>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn sort_by(mut self, clause: SortClause) -> Self {
        self.sort.push(clause);
        self
    }

    pub fn paginate(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn facet(mut self, attribute: impl Into<String>) -> Self {
        self.facets.push(attribute.into());
        self
    }

    /// Returns the trimmed relevance text if it is not blank.
    pub fn relevance_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Result of a query: one window of hits plus totals over all matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub hits: Vec<Value>,
    pub total: u64,
    pub facet_distribution: FacetDistribution,
}

/// Storage type of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exact-match string (ids, enums, tags).
    Keyword,
    /// Analyzed free text.
    Text,
    /// Integer, also accepted when encoded as a decimal string.
    Long,
    Date,
    /// Stored but not indexed.
    Unindexed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Dotted path of the field, e.g. `metrics.viewsCount`.
    pub name: String,
    pub kind: FieldKind,
}

impl FieldMapping {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One step of the index ranking pipeline, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingRule {
    Words,
    Exactness,
    Typo,
    Proximity,
    Attribute,
    /// Position at which the query's explicit sort clauses apply.
    Sort,
    Asc(String),
    Desc(String),
}

impl RankingRule {
    fn is_relevance(&self) -> bool {
        matches!(
            self,
            RankingRule::Words
                | RankingRule::Exactness
                | RankingRule::Typo
                | RankingRule::Proximity
                | RankingRule::Attribute
        )
    }
}

/// A resolved ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Relevance,
    Field(SortClause),
}

/// Declarative configuration of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub name: String,
    pub primary_key: String,
    pub fields: Vec<FieldMapping>,
    /// Attributes matched by relevance text, in decreasing order of importance.
    pub searchable: Vec<String>,
    pub filterable: Vec<String>,
    pub sortable: Vec<String>,
    pub ranking_rules: Vec<RankingRule>,
}

impl IndexSettings {
    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.kind)
    }

    /// Rejects queries that filter, facet or sort on attributes not declared for it.
    pub fn validate_query(&self, query: &DocumentQuery) -> Result<(), DocumentStoreError> {
        for filter in &query.filters {
            if !self.filterable.iter().any(|f| f == filter.field()) {
                return Err(DocumentStoreError::validation(format!(
                    "attribute '{}' is not filterable on index '{}'",
                    filter.field(),
                    self.name
                )));
            }
        }
        for facet in &query.facets {
            if !self.filterable.iter().any(|f| f == facet) {
                return Err(DocumentStoreError::validation(format!(
                    "attribute '{}' is not filterable on index '{}'",
                    facet, self.name
                )));
            }
        }
        for clause in &query.sort {
            if !self.sortable.iter().any(|f| *f == clause.field) {
                return Err(DocumentStoreError::validation(format!(
                    "attribute '{}' is not sortable on index '{}'",
                    clause.field, self.name
                )));
            }
        }
        Ok(())
    }

    /// Resolves the ordering of a query from the ranking rules.
    ///
    /// Relevance rules collapse into a single `Relevance` key and only apply when the query
    /// has text. The `Sort` rule expands to the query's sort clauses.
    pub fn sort_plan(&self, has_text: bool, query_sort: &[SortClause]) -> Vec<SortKey> {
        let mut plan = Vec::new();
        for rule in &self.ranking_rules {
            match rule {
                rule if rule.is_relevance() => {
                    if has_text && plan.last() != Some(&SortKey::Relevance) {
                        plan.push(SortKey::Relevance);
                    }
                }
                RankingRule::Sort => {
                    plan.extend(query_sort.iter().cloned().map(SortKey::Field));
                }
                RankingRule::Asc(field) => plan.push(SortKey::Field(SortClause::asc(field))),
                RankingRule::Desc(field) => plan.push(SortKey::Field(SortClause::desc(field))),
                _ => {}
            }
        }
        if !self.ranking_rules.contains(&RankingRule::Sort) {
            plan.extend(query_sort.iter().cloned().map(SortKey::Field));
        }
        plan
    }
}
