//! Orders: comparators that sort a selection's accumulated records.
//!
//! An order compares two records with a fixed tie-break policy. When its
//! `ascending` property is false the final result is reversed; the tie-break
//! internals are not. An order may also push its sort down into the query so
//! the engine returns pages already in order, but the in-memory merge stays
//! authoritative.

pub mod alphabetical;
pub mod featured;
pub mod published;
pub mod sequence;

use std::cmp::Ordering;

pub use alphabetical::Alphabetical;
pub use featured::FeaturedFirst;
pub use published::PublishedDate;
pub use sequence::Sequence;

use crate::content::{ContentRecord, Query, SortOrder};
use crate::module::{ModuleClass, Referencing};

/// Every built-in order class.
pub const CLASSES: &[ModuleClass] = &[
    alphabetical::CLASS,
    featured::CLASS,
    published::CLASS,
    sequence::CLASS,
];

/// Property names shared by every order class.
pub(crate) const PROPERTIES: &[&str] = &["ascending"];

pub trait Order: Referencing {
    fn ascending(&self) -> bool;

    /// Ascending comparison, including tie-breaks.
    fn compare_impl(&self, left: &ContentRecord, right: &ContentRecord) -> Ordering;

    fn compare(&self, left: &ContentRecord, right: &ContentRecord) -> Ordering {
        let ordering = self.compare_impl(left, right);
        if self.ascending() {
            ordering
        } else {
            ordering.reverse()
        }
    }

    /// Push the sort into `query`. The default leaves it untouched.
    fn modify_query(&self, query: &Query) -> Query {
        query.clone()
    }
}

pub(crate) fn sort_order(ascending: bool) -> SortOrder {
    if ascending {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    }
}

// ---------------------------------------------------------------------------
// Shared comparators
// ---------------------------------------------------------------------------

/// Case-folded title, then the raw title.
pub fn compare_titles(left: &ContentRecord, right: &ContentRecord) -> Ordering {
    left.title
        .to_lowercase()
        .cmp(&right.title.to_lowercase())
        .then_with(|| left.title.cmp(&right.title))
}

/// Publication date; a missing date sorts earliest.
pub fn compare_published(left: &ContentRecord, right: &ContentRecord) -> Ordering {
    left.published.cmp(&right.published)
}

/// Sequence number; a missing number sorts first.
pub fn compare_sequence(left: &ContentRecord, right: &ContentRecord) -> Ordering {
    left.sequence_number.cmp(&right.sequence_number)
}

/// Featured records sort before the rest.
pub fn compare_featured(left: &ContentRecord, right: &ContentRecord) -> Ordering {
    right.featured.cmp(&left.featured)
}

// ===========================================================================
// Tests
// ===========================================================================
