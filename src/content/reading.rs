//! Reading-history collaborator.

use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::event::Emitter;

/// Which records the user has already read.
///
/// Filters that hide or prioritise seen content consume this; they refresh
/// their selections when `changed` fires.
pub trait ReadingHistory {
    fn is_read(&self, id: &str) -> bool;
    fn mark_read(&self, id: &str);
    fn all_read_ids(&self) -> BTreeSet<String>;
    /// Fires after the set of read ids changed.
    fn changed(&self) -> &Emitter<()>;
}

/// In-memory [`ReadingHistory`].
#[derive(Debug, Default)]
pub struct MemoryReadingHistory {
    read: RefCell<BTreeSet<String>>,
    changed: Emitter<()>,
}

impl MemoryReadingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let history = Self::new();
        history
            .read
            .borrow_mut()
            .extend(ids.into_iter().map(Into::into));
        history
    }
}

impl ReadingHistory for MemoryReadingHistory {
    fn is_read(&self, id: &str) -> bool {
        self.read.borrow().contains(id)
    }

    fn mark_read(&self, id: &str) {
        let inserted = self.read.borrow_mut().insert(id.to_string());
        if inserted {
            tracing::debug!(id, "marked read");
            self.changed.emit(&());
        }
    }

    fn all_read_ids(&self) -> BTreeSet<String> {
        self.read.borrow().clone()
    }

    fn changed(&self) -> &Emitter<()> {
        &self.changed
    }
}
