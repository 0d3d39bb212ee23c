//! Filters: predicates applied to every record a selection receives.
//!
//! A filter keeps a record when `include` returns true. The `invert` property
//! negates the subtype predicate. A filter may also rewrite the query so the
//! engine drops records early; that rewrite must always select a superset of
//! what `include` keeps, since `include` still runs on every record.
//!
//! Filters that depend on state outside the record (reading history, another
//! selection's contents) expose a `changed` emitter. Selections subscribe to
//! it and refresh.

pub mod featured;
pub mod other_group;
pub mod tagged;
pub mod unread;

pub use featured::Featured;
pub use other_group::OtherGroup;
pub use tagged::Tagged;
pub use unread::Unread;

use crate::content::{ContentRecord, Query};
use crate::event::Emitter;
use crate::module::{ModuleClass, Referencing};

/// Every built-in filter class.
pub const CLASSES: &[ModuleClass] = &[featured::CLASS, other_group::CLASS, tagged::CLASS, unread::CLASS];

pub trait Filter: Referencing {
    fn invert(&self) -> bool;

    /// The subtype predicate, before `invert` applies.
    fn include_impl(&self, record: &ContentRecord) -> bool;

    fn include(&self, record: &ContentRecord) -> bool {
        self.include_impl(record) != self.invert()
    }

    /// Narrow `query` ahead of the engine. The default leaves it untouched.
    fn modify_query(&self, query: &Query) -> Query {
        query.clone()
    }

    /// Fires when the outcome of `include` may have changed for some record.
    fn changed(&self) -> Option<&Emitter<()>> {
        None
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{MemoryReadingHistory, ReadingHistory};
    use proptest::prelude::*;
    use std::rc::Rc;

    fn arb_record() -> impl Strategy<Value = ContentRecord> {
        ("[a-e]", any::<bool>(), proptest::collection::btree_set("[xyz]", 0..3)).prop_map(
            |(id, featured, tags)| {
                let mut record = ContentRecord::new(id).featured(featured);
                record.tags = tags;
                record
            },
        )
    }

    fn pairs() -> Vec<(Box<dyn Filter>, Box<dyn Filter>)> {
        let reading: Rc<dyn ReadingHistory> = Rc::new(MemoryReadingHistory::with_read(["a", "c"]));
        vec![
            (Box::new(Featured::new(false)), Box::new(Featured::new(true))),
            (Box::new(Tagged::new("x", false)), Box::new(Tagged::new("x", true))),
            (
                Box::new(Unread::new(Rc::clone(&reading), false)),
                Box::new(Unread::new(reading, true)),
            ),
            (Box::new(OtherGroup::new(false)), Box::new(OtherGroup::new(true))),
        ]
    }

    // ── Invert law ───────────────────────────────────────────────────

    proptest! {
        #[test]
        fn invert_negates_include(record in arb_record()) {
            for (plain, inverted) in pairs() {
                prop_assert_eq!(inverted.include(&record), !plain.include(&record));
            }
        }

        #[test]
        fn query_rewrite_never_drops_included_records(record in arb_record()) {
            use crate::content::MemoryEngine;
            let engine = MemoryEngine::with_records([record.clone()]);
            for (plain, inverted) in pairs() {
                for filter in [plain, inverted] {
                    if filter.include(&record) {
                        let query = filter.modify_query(&Query::new());
                        let found = engine.execute(&query).unwrap();
                        prop_assert!(found.records.iter().any(|r| r.id == record.id));
                    }
                }
            }
        }
    }
}
