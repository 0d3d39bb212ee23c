//! HistoryStore: the single source of navigation truth.
//!
//! The store owns the current [`HistoryItem`], a bounded back stack, and a
//! forward stack. It is mutated only through its transition methods, each of
//! which emits exactly one `changed` notification carrying the [`Direction`].
//! Narrower facets (`current_set`, `current_query`) have
//! their own emitters, which fire only when the facet's value differs.

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::debug;

use super::item::{Direction, HistoryItem, PageType};
use crate::content::{terms, ContentRecord};
use crate::event::Emitter;

/// Default bound on the back stack.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

#[derive(Debug, Default)]
struct State {
    current: Option<HistoryItem>,
    /// Oldest first.
    back: VecDeque<HistoryItem>,
    /// Top of the stack is the last element.
    forward: Vec<HistoryItem>,
}

/// Facet values captured before a transition.
struct Facets {
    set: Option<String>,
    query: String,
}

#[derive(Debug)]
pub struct HistoryStore {
    state: RefCell<State>,
    depth: usize,
    changed: Emitter<Direction>,
    set_changed: Emitter<()>,
    query_changed: Emitter<()>,
}

impl HistoryStore {
    /// An empty store with the default depth bound.
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// A store whose back stack keeps at most `depth` items.
    pub fn with_depth(depth: usize) -> Self {
        Self {
            state: RefCell::new(State::default()),
            depth,
            changed: Emitter::new(),
            set_changed: Emitter::new(),
            query_changed: Emitter::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Fires once per transition with the direction of travel.
    pub fn changed(&self) -> &Emitter<Direction> {
        &self.changed
    }

    /// Fires when the current set differs after a transition.
    pub fn set_changed(&self) -> &Emitter<()> {
        &self.set_changed
    }

    /// Fires when the current search terms differ after a transition.
    pub fn query_changed(&self) -> &Emitter<()> {
        &self.query_changed
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The page being shown, if any.
    pub fn current_item(&self) -> Option<HistoryItem> {
        self.state.borrow().current.clone()
    }

    /// Whether `go_back` would move.
    pub fn can_go_back(&self) -> bool {
        !self.state.borrow().back.is_empty()
    }

    /// Whether `go_forward` would move.
    pub fn can_go_forward(&self) -> bool {
        !self.state.borrow().forward.is_empty()
    }

    /// Number of items on the back stack.
    pub fn back_len(&self) -> usize {
        self.state.borrow().back.len()
    }

    /// Number of items on the forward stack.
    pub fn forward_len(&self) -> usize {
        self.state.borrow().forward.len()
    }

    /// The item `go_forward` would move to.
    pub fn forward_top(&self) -> Option<HistoryItem> {
        self.state.borrow().forward.last().cloned()
    }

    /// Bound on the back stack.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The nearest item (current first, then backwards) matching `pred`.
    pub fn search_backwards(&self, pred: impl Fn(&HistoryItem) -> bool) -> Option<HistoryItem> {
        let state = self.state.borrow();
        state
            .current
            .iter()
            .chain(state.back.iter().rev())
            .find(|item| pred(item))
            .cloned()
    }

    /// The set of the nearest set page.
    pub fn current_set(&self) -> Option<ContentRecord> {
        self.search_backwards(|item| item.page_type == PageType::Set)
            .and_then(|item| item.model)
    }

    /// Search terms of the nearest item that has any; empty otherwise.
    pub fn current_query(&self) -> String {
        self.search_backwards(|item| !item.query.is_empty())
            .map(|item| item.query)
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Navigate to `item`.
    ///
    /// The previous item goes onto the back stack (dropping the oldest past
    /// the depth bound) and the forward stack is cleared. Navigating to an
    /// item equal to the current one does nothing.
    pub fn set_current_item(&self, item: HistoryItem) {
        self.push_item(item, Direction::Forward);
    }

    /// Like [`set_current_item`](Self::set_current_item), but records
    /// `direction` on the new item and in the `changed` notification.
    /// Sequential navigation uses this to push a "previous" page as `Back`.
    pub fn push_item(&self, item: HistoryItem, direction: Direction) {
        let before = self.facets();
        {
            let mut state = self.state.borrow_mut();
            if let Some(current) = &state.current {
                if current.equals(&item) {
                    return;
                }
            }
            if let Some(previous) = state.current.take() {
                push_bounded(&mut state.back, previous, self.depth);
            }
            state.forward.clear();
            state.current = Some(item.with_direction(direction));
        }
        self.finish(direction, before);
    }

    /// Swap the current item without touching either stack.
    pub fn replace_current_item(&self, item: HistoryItem) {
        let before = self.facets();
        self.state.borrow_mut().current = Some(item.with_direction(Direction::Replace));
        self.finish(Direction::Replace, before);
    }

    /// Step back. A no-op when the back stack is empty.
    pub fn go_back(&self) {
        let before = self.facets();
        {
            let mut state = self.state.borrow_mut();
            let Some(target) = state.back.pop_back() else {
                return;
            };
            if let Some(current) = state.current.take() {
                state.forward.push(current);
            }
            state.current = Some(target.with_direction(Direction::Back));
        }
        self.finish(Direction::Back, before);
    }

    /// Step forward. A no-op when the forward stack is empty.
    pub fn go_forward(&self) {
        let before = self.facets();
        {
            let mut state = self.state.borrow_mut();
            let Some(target) = state.forward.pop() else {
                return;
            };
            if let Some(current) = state.current.take() {
                push_bounded(&mut state.back, current, self.depth);
            }
            state.current = Some(target.with_direction(Direction::Forward));
        }
        self.finish(Direction::Forward, before);
    }

    /// Navigate to a search page for `raw`, after sanitising it.
    /// Text with no searchable terms is ignored.
    pub fn do_search(&self, raw: &str) {
        let query = terms::sanitize(raw);
        if query.is_empty() {
            debug!(raw, "ignoring empty search");
            return;
        }
        self.set_current_item(HistoryItem::search(query));
    }

    fn facets(&self) -> Facets {
        Facets {
            set: self.current_set().map(|s| s.id),
            query: self.current_query(),
        }
    }

    fn finish(&self, direction: Direction, before: Facets) {
        debug!(
            ?direction,
            back = self.back_len(),
            forward = self.forward_len(),
            "history changed"
        );
        self.changed.emit(&direction);
        let after = self.facets();
        if after.query != before.query {
            self.query_changed.emit(&());
        }
        if after.set != before.set {
            self.set_changed.emit(&());
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(stack: &mut VecDeque<HistoryItem>, item: HistoryItem, depth: usize) {
    stack.push_back(item);
    while stack.len() > depth {
        stack.pop_front();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
