//! Content engine collaborator: trait, results, errors, in-memory engine.
//!
//! The engine is an opaque query service. The composition core only needs to
//! submit a [`Query`] and eventually receive a page of records or a
//! [`QueryError`]. [`MemoryEngine`] is a complete in-process implementation
//! used by tests, demos, and headless harnesses.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::query::{Query, Sort, SortOrder};
use super::record::ContentRecord;
use crate::order::{compare_published, compare_sequence, compare_titles};

// ---------------------------------------------------------------------------
// Results and errors
// ---------------------------------------------------------------------------

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResults {
    pub records: Vec<ContentRecord>,
    /// Whether the engine holds further records past this page.
    pub more: bool,
}

impl QueryResults {
    pub fn new(records: Vec<ContentRecord>, more: bool) -> Self {
        Self { records, more }
    }

    /// A final page holding `records`.
    pub fn last(records: Vec<ContentRecord>) -> Self {
        Self::new(records, false)
    }
}

/// Machine-readable reason for a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryErrorReason {
    NotFound,
    BackendUnavailable,
    MalformedQuery,
}

impl fmt::Display for QueryErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryErrorReason::NotFound => "not found",
            QueryErrorReason::BackendUnavailable => "backend unavailable",
            QueryErrorReason::MalformedQuery => "malformed query",
        };
        f.write_str(s)
    }
}

/// A failed content query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("query failed ({reason}): {message}")]
pub struct QueryError {
    pub reason: QueryErrorReason,
    pub message: String,
}

impl QueryError {
    pub fn new(reason: QueryErrorReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(QueryErrorReason::BackendUnavailable, message)
    }
}

// ---------------------------------------------------------------------------
// ContentEngine trait
// ---------------------------------------------------------------------------

/// The query capability the composition core consumes.
///
/// Calls are asynchronous and may suspend; the core runs them on a
/// single-threaded executor, so implementations need not be `Send`.
#[async_trait(?Send)]
pub trait ContentEngine {
    async fn query(&self, query: &Query) -> Result<QueryResults, QueryError>;
}

// ---------------------------------------------------------------------------
// MemoryEngine
// ---------------------------------------------------------------------------

/// In-memory content engine honouring every [`Query`] field.
///
/// Sorting uses the same comparators as the `Order` modules, so a query-level
/// sort always agrees with the in-memory one.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    records: RefCell<Vec<ContentRecord>>,
    failures: RefCell<VecDeque<QueryError>>,
    log: RefCell<Vec<Query>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let engine = Self::new();
        for r in records {
            engine.add(r);
        }
        engine
    }

    /// Add a record, replacing any record with the same id.
    pub fn add(&self, record: ContentRecord) {
        let mut records = self.records.borrow_mut();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub fn get(&self, id: &str) -> Option<ContentRecord> {
        self.records.borrow().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Make the next query fail with `error`. Failures queue up in order.
    pub fn fail_next(&self, error: QueryError) {
        self.failures.borrow_mut().push_back(error);
    }

    /// Every query received so far, in arrival order.
    pub fn queries(&self) -> Vec<Query> {
        self.log.borrow().clone()
    }

    /// Run `query` synchronously.
    pub fn execute(&self, query: &Query) -> Result<QueryResults, QueryError> {
        self.log.borrow_mut().push(query.clone());
        if let Some(err) = self.failures.borrow_mut().pop_front() {
            return Err(err);
        }
        if query.limit == 0 {
            return Err(QueryError::new(
                QueryErrorReason::MalformedQuery,
                "limit must be positive",
            ));
        }

        let terms: Vec<String> = query
            .terms
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let mut matched: Vec<ContentRecord> = self
            .records
            .borrow()
            .iter()
            .filter(|r| matches(query, &terms, r))
            .cloned()
            .collect();

        let compare: Option<fn(&ContentRecord, &ContentRecord) -> Ordering> = match query.sort {
            Sort::Relevance => None,
            Sort::Date => Some(compare_published),
            Sort::Sequence => Some(compare_sequence),
            Sort::Title => Some(compare_titles),
        };
        if let Some(compare) = compare {
            // Descending reverses the comparison, so ties keep insertion order.
            match query.order {
                SortOrder::Ascending => matched.sort_by(compare),
                SortOrder::Descending => matched.sort_by(|a, b| compare(b, a)),
            }
        }

        let total = matched.len();
        let page: Vec<ContentRecord> = matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        let more = query.offset + page.len() < total;
        Ok(QueryResults::new(page, more))
    }
}

fn matches(query: &Query, terms: &[String], r: &ContentRecord) -> bool {
    if !query.ids.is_empty() && !query.ids.contains(&r.id) {
        return false;
    }
    if query.excluded_ids.contains(&r.id) {
        return false;
    }
    if !query.tags_match_all.iter().all(|t| r.has_tag(t)) {
        return false;
    }
    if !query.tags_match_any.is_empty() && !query.tags_match_any.iter().any(|t| r.has_tag(t)) {
        return false;
    }
    if query.excluded_tags.iter().any(|t| r.has_tag(t)) {
        return false;
    }
    if let Some(featured) = query.featured {
        if r.featured != featured {
            return false;
        }
    }
    if !terms.is_empty() {
        let haystack = format!("{} {}", r.title, r.synopsis).to_lowercase();
        if !terms.iter().all(|t| haystack.contains(t.as_str())) {
            return false;
        }
    }
    true
}

#[async_trait(?Send)]
impl ContentEngine for MemoryEngine {
    async fn query(&self, query: &Query) -> Result<QueryResults, QueryError> {
        self.execute(query)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
