//! Query: an immutable description of a content request.
//!
//! Queries are plain values. Deriving a new query from an existing one always
//! goes through a clone, so the original is never touched:
//!
//! ```
//! use gilt_compose::content::Query;
//!
//! let base = Query::new().with_tags_match_all(["A"]);
//! let derived = base.clone().with_excluded_ids(["5"]);
//! assert!(base.excluded_ids.is_empty());
//! assert_eq!(derived.tags_match_all, vec!["A".to_string()]);
//! ```

use serde::{Deserialize, Serialize};

/// Field a query's results are sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sort {
    /// Engine-defined relevance (insertion order for non-search queries).
    #[default]
    Relevance,
    Date,
    Sequence,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Default number of records requested per query.
pub const DEFAULT_LIMIT: usize = 10;

/// A structured content request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Free-text search terms, already sanitised. Empty means no text match.
    #[serde(default)]
    pub terms: String,
    /// A record must carry every one of these tags.
    #[serde(default)]
    pub tags_match_all: Vec<String>,
    /// A record must carry at least one of these tags (ignored when empty).
    #[serde(default)]
    pub tags_match_any: Vec<String>,
    #[serde(default)]
    pub excluded_tags: Vec<String>,
    /// Id allow-list (ignored when empty).
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub excluded_ids: Vec<String>,
    /// Restrict to featured (`Some(true)`) or non-featured records.
    #[serde(default)]
    pub featured: Option<bool>,
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub order: SortOrder,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            terms: String::new(),
            tags_match_all: Vec::new(),
            tags_match_any: Vec::new(),
            excluded_tags: Vec::new(),
            ids: Vec::new(),
            excluded_ids: Vec::new(),
            featured: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: Sort::Relevance,
            order: SortOrder::Ascending,
        }
    }
}

fn extend_unique(list: &mut Vec<String>, items: impl IntoIterator<Item = impl Into<String>>) {
    for item in items {
        let item = item.into();
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_terms(mut self, terms: impl Into<String>) -> Self {
        self.terms = terms.into();
        self
    }

    pub fn with_tags_match_all(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        extend_unique(&mut self.tags_match_all, tags);
        self
    }

    pub fn with_tags_match_any(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        extend_unique(&mut self.tags_match_any, tags);
        self
    }

    pub fn with_excluded_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        extend_unique(&mut self.excluded_tags, tags);
        self
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        extend_unique(&mut self.ids, ids);
        self
    }

    pub fn with_excluded_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        extend_unique(&mut self.excluded_ids, ids);
        self
    }

    pub fn with_featured(mut self, featured: Option<bool>) -> Self {
        self.featured = featured;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sort(mut self, sort: Sort, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let q = Query::new();
        assert!(q.terms.is_empty());
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);
        assert_eq!(q.sort, Sort::Relevance);
        assert_eq!(q.order, SortOrder::Ascending);
        assert!(q.featured.is_none());
    }

    #[test]
    fn derived_query_leaves_original_alone() {
        let base = Query::new().with_tags_match_all(["A"]);
        let derived = base.clone().with_excluded_ids(["5"]);

        assert_eq!(derived.excluded_ids, vec!["5".to_string()]);
        assert_eq!(derived.tags_match_all, vec!["A".to_string()]);
        assert!(base.excluded_ids.is_empty());
    }

    #[test]
    fn list_builders_skip_duplicates() {
        let q = Query::new()
            .with_excluded_ids(["1", "2"])
            .with_excluded_ids(["2", "3"]);
        assert_eq!(q.excluded_ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn sort_serializes_kebab_case() {
        let q = Query::new().with_sort(Sort::Date, SortOrder::Descending);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["sort"], "date");
        assert_eq!(json["order"], "descending");
    }
}
