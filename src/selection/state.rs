//! The Selection state machine.
//!
//! A selection owns an accumulated, deduplicated, filtered and optionally
//! ordered list of records, built up one load cycle at a time. The machine
//! does no I/O: [`Selection::queue_load_more`] and [`Selection::complete`]
//! hand back the next [`FetchRequest`] to execute, and the
//! [`Loader`](super::Loader) runs them against the content engine.
//!
//! ## Load cycles
//!
//! A cycle wants `limit` new records. It visits the source's query indices in
//! order, at most once each, skipping exhausted ones, until enough records
//! were kept or no index is left. Then the state moves to `Ready` (or `Error`
//! when every fetch in the cycle failed) and `models_changed` fires once.
//!
//! Per fetch, records are processed in arrival order:
//!
//! 1. records whose id is already held are dropped;
//! 2. records rejected by any filter are dropped;
//! 3. survivors are inserted by the order (after equal elements) or appended;
//! 4. once the cycle has what it wants the rest of the page is left for the
//!    next cycle, so the index cursor only advances past records stepped
//!    through.
//!
//! ## Refresh
//!
//! `mark_needs_refresh` sets a dirty flag and fires `refresh_requested` on
//! the clean to dirty edge only. The next `queue_load_more` drops everything
//! held, supersedes any fetch in flight and starts paging from zero.
//!
//! Only one fetch is in flight at a time. A non-dirty `queue_load_more`
//! during a cycle is coalesced into a single follow-up cycle.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::source::SelectionSource;
use crate::content::{ContentRecord, Query, QueryError, QueryResults};
use crate::event::{Action, Emitter, Subscription};
use crate::filter::Filter;
use crate::history::HistoryStore;
use crate::module::AppContext;
use crate::order::Order;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Identifies one fetch. Completions carrying an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchToken(u64);

/// A query the selection wants executed.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub token: FetchToken,
    pub query_index: usize,
    pub query: Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionState::Idle => "idle",
            SelectionState::Loading => "loading",
            SelectionState::Ready => "ready",
            SelectionState::Error => "error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    offset: usize,
    exhausted: bool,
}

#[derive(Debug)]
struct Cycle {
    wanted: usize,
    kept: usize,
    next_index: usize,
    in_flight: Option<(FetchToken, usize)>,
    attempted: usize,
    failed: usize,
    last_error: Option<QueryError>,
}

impl Cycle {
    fn new(wanted: usize) -> Self {
        Self {
            wanted,
            kept: 0,
            next_index: 0,
            in_flight: None,
            attempted: 0,
            failed: 0,
            last_error: None,
        }
    }

    fn remaining(&self) -> usize {
        self.wanted.saturating_sub(self.kept)
    }
}

#[derive(Debug)]
struct Inner {
    state: SelectionState,
    models: Vec<ContentRecord>,
    ids: HashSet<String>,
    cursors: Vec<Cursor>,
    dirty: bool,
    next_token: u64,
    cycle: Option<Cycle>,
    /// Coalesced load request; the largest limit wins.
    pending: Option<usize>,
    error: Option<QueryError>,
}

impl Inner {
    fn in_flight(&self) -> Option<(FetchToken, usize)> {
        self.cycle.as_ref().and_then(|c| c.in_flight)
    }

    fn reset(&mut self) {
        self.models.clear();
        self.ids.clear();
        self.cursors.iter_mut().for_each(|c| *c = Cursor::default());
        self.cycle = None;
        self.pending = None;
        self.error = None;
        self.dirty = false;
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

pub struct Selection {
    source: Box<dyn SelectionSource>,
    filters: Vec<Rc<dyn Filter>>,
    order: Option<Rc<dyn Order>>,
    overfetch: usize,
    inner: RefCell<Inner>,
    models_changed: Emitter<()>,
    state_changed: Emitter<SelectionState>,
    refresh_requested: Emitter<()>,
    watches: RefCell<Vec<Subscription>>,
}

impl Selection {
    /// `overfetch` multiplies the page size of every fetch when filters are
    /// attached, so that filtering still leaves enough records.
    pub fn new(
        source: Box<dyn SelectionSource>,
        filters: Vec<Rc<dyn Filter>>,
        order: Option<Rc<dyn Order>>,
        overfetch: usize,
    ) -> Self {
        let cursors = vec![Cursor::default(); source.query_count()];
        Self {
            source,
            filters,
            order,
            overfetch: overfetch.max(1),
            inner: RefCell::new(Inner {
                state: SelectionState::Idle,
                models: Vec::new(),
                ids: HashSet::new(),
                cursors,
                dirty: false,
                next_token: 0,
                cycle: None,
                pending: None,
                error: None,
            }),
            models_changed: Emitter::new(),
            state_changed: Emitter::new(),
            refresh_requested: Emitter::new(),
            watches: RefCell::new(Vec::new()),
        }
    }

    // -- accessors --------------------------------------------------------

    /// The module type name of the source, such as `Selection.All`.
    pub fn type_name(&self) -> &'static str {
        self.source.type_name()
    }

    /// The per-type query builder.
    pub fn source(&self) -> &dyn SelectionSource {
        self.source.as_ref()
    }

    /// Filters every fetched record must pass.
    pub fn filters(&self) -> &[Rc<dyn Filter>] {
        &self.filters
    }

    /// The order held records are kept in; arrival order when `None`.
    pub fn order(&self) -> Option<&Rc<dyn Order>> {
        self.order.as_ref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SelectionState {
        self.inner.borrow().state
    }

    /// A copy of the held records, in display order.
    pub fn models(&self) -> Vec<ContentRecord> {
        self.inner.borrow().models.clone()
    }

    /// Ids of the held records, in display order.
    pub fn model_ids(&self) -> Vec<String> {
        self.inner.borrow().models.iter().map(|m| m.id.clone()).collect()
    }

    /// Whether a record with `id` is held.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.borrow().ids.contains(id)
    }

    /// Number of held records.
    pub fn len(&self) -> usize {
        self.inner.borrow().models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The error of the last cycle, when every fetch in it failed.
    pub fn error(&self) -> Option<QueryError> {
        self.inner.borrow().error.clone()
    }

    /// Whether the held records are stale and the next load starts over.
    pub fn needs_refresh(&self) -> bool {
        self.inner.borrow().dirty
    }

    /// Whether a load cycle is running.
    pub fn is_loading(&self) -> bool {
        self.inner.borrow().cycle.is_some()
    }

    /// Every query index is drained. Orthogonal to [`state`](Self::state).
    pub fn is_exhausted(&self) -> bool {
        self.inner.borrow().cursors.iter().all(|c| c.exhausted)
    }

    /// Whether a `queue_load_more` could fetch anything.
    pub fn can_load_more(&self) -> bool {
        let inner = self.inner.borrow();
        inner.dirty || inner.cursors.iter().any(|c| !c.exhausted)
    }

    /// Fires once per completed load cycle.
    pub fn models_changed(&self) -> &Emitter<()> {
        &self.models_changed
    }

    /// Fires on every state transition with the new state.
    pub fn state_changed(&self) -> &Emitter<SelectionState> {
        &self.state_changed
    }

    /// Fires when the selection turns dirty.
    pub fn refresh_requested(&self) -> &Emitter<()> {
        &self.refresh_requested
    }

    /// The navigation action that replaces pagination for this source, if any.
    pub fn show_more_action(&self, history: &HistoryStore) -> Option<Action> {
        self.source.show_more(history)
    }

    // -- transitions ------------------------------------------------------

    /// Flag the held records as stale. Idempotent.
    pub fn mark_needs_refresh(&self) {
        let edge = {
            let mut inner = self.inner.borrow_mut();
            !std::mem::replace(&mut inner.dirty, true)
        };
        if edge {
            debug!(selection = self.type_name(), "needs refresh");
            self.refresh_requested.emit(&());
        }
    }

    /// Ask for up to `limit` more records.
    ///
    /// Returns the first fetch of a new cycle, or `None` when the request was
    /// coalesced into the running cycle or there is nothing left to load.
    pub fn queue_load_more(&self, limit: usize) -> Option<FetchRequest> {
        if limit == 0 {
            return None;
        }
        {
            let mut inner = self.inner.borrow_mut();
            if inner.dirty {
                if inner.cycle.is_some() {
                    debug!(selection = self.type_name(), "superseding in-flight fetch");
                }
                inner.reset();
            } else if inner.cycle.is_some() {
                let pending = inner.pending.map_or(limit, |p| p.max(limit));
                inner.pending = Some(pending);
                debug!(selection = self.type_name(), pending, "coalesced load request");
                return None;
            }
            if inner.cursors.iter().all(|c| c.exhausted) {
                return None;
            }
            inner.cycle = Some(Cycle::new(limit));
        }
        debug!(selection = self.type_name(), limit, "load cycle started");
        self.set_state(SelectionState::Loading);
        self.advance()
    }

    /// Feed the outcome of the fetch identified by `token`.
    ///
    /// Stale tokens are ignored. Returns the next fetch of the cycle, or of a
    /// coalesced follow-up cycle.
    pub fn complete(
        &self,
        token: FetchToken,
        outcome: Result<QueryResults, QueryError>,
    ) -> Option<FetchRequest> {
        let in_flight = self.inner.borrow().in_flight();
        let Some((current, index)) = in_flight else {
            debug!(selection = self.type_name(), ?token, "dropping completion with no fetch in flight");
            return None;
        };
        if current != token {
            debug!(selection = self.type_name(), ?token, "dropping stale completion");
            return None;
        }

        match outcome {
            Ok(results) => {
                // Filters may consult other selections; run them unborrowed.
                let verdicts: Vec<bool> = results
                    .records
                    .iter()
                    .map(|record| self.filters.iter().all(|f| f.include(record)))
                    .collect();
                self.absorb(index, results, verdicts);
            }
            Err(error) => {
                warn!(
                    selection = self.type_name(),
                    query_index = index,
                    reason = %error.reason,
                    error = %error,
                    "query failed"
                );
                let mut inner = self.inner.borrow_mut();
                if let Some(cycle) = inner.cycle.as_mut() {
                    cycle.in_flight = None;
                    cycle.failed += 1;
                    cycle.last_error = Some(error);
                }
            }
        }
        self.advance()
    }

    fn absorb(&self, index: usize, results: QueryResults, verdicts: Vec<bool>) {
        let mut inner = self.inner.borrow_mut();
        let Inner {
            models,
            ids,
            cursors,
            cycle,
            ..
        } = &mut *inner;
        let Some(cycle) = cycle.as_mut() else {
            return;
        };
        let remaining = cycle.remaining();
        let total = results.records.len();
        let mut stepped = 0;
        let mut kept = 0;
        for (record, include) in results.records.into_iter().zip(verdicts) {
            if kept == remaining {
                break;
            }
            stepped += 1;
            if !include || ids.contains(&record.id) {
                continue;
            }
            ids.insert(record.id.clone());
            match &self.order {
                Some(order) => {
                    let at = models.partition_point(|m| order.compare(m, &record) != Ordering::Greater);
                    models.insert(at, record);
                }
                None => models.push(record),
            }
            kept += 1;
        }
        if let Some(cursor) = cursors.get_mut(index) {
            cursor.offset += stepped;
            cursor.exhausted = !results.more && stepped == total;
        }
        cycle.kept += kept;
        cycle.in_flight = None;
        debug!(
            selection = self.type_name(),
            query_index = index,
            received = total,
            kept,
            "fetch absorbed"
        );
    }

    /// Issue the next fetch of the running cycle, or finish it.
    fn advance(&self) -> Option<FetchRequest> {
        loop {
            let plan = {
                let mut inner = self.inner.borrow_mut();
                let Inner { cursors, cycle, .. } = &mut *inner;
                let cycle = cycle.as_mut()?;
                let remaining = cycle.remaining();
                let next = (cycle.next_index..cursors.len()).find(|&i| !cursors[i].exhausted);
                match next {
                    Some(index) if remaining > 0 => {
                        cycle.next_index = index + 1;
                        Some((index, cursors[index].offset, remaining))
                    }
                    _ => None,
                }
            };

            let Some((index, offset, remaining)) = plan else {
                return self.finish_cycle();
            };
            let limit = if self.filters.is_empty() {
                remaining
            } else {
                remaining.saturating_mul(self.overfetch)
            };
            match self.build_query(index, offset, limit) {
                Some(query) => {
                    let mut inner = self.inner.borrow_mut();
                    let token = FetchToken(inner.next_token);
                    inner.next_token += 1;
                    let cycle = inner.cycle.as_mut()?;
                    cycle.in_flight = Some((token, index));
                    cycle.attempted += 1;
                    return Some(FetchRequest {
                        token,
                        query_index: index,
                        query,
                    });
                }
                None => {
                    if let Some(cursor) = self.inner.borrow_mut().cursors.get_mut(index) {
                        cursor.exhausted = true;
                    }
                }
            }
        }
    }

    fn build_query(&self, index: usize, offset: usize, limit: usize) -> Option<Query> {
        let mut query = self
            .source
            .build_query(index)?
            .with_offset(offset)
            .with_limit(limit);
        for filter in &self.filters {
            query = filter.modify_query(&query);
        }
        if let Some(order) = &self.order {
            query = order.modify_query(&query);
        }
        Some(query)
    }

    fn finish_cycle(&self) -> Option<FetchRequest> {
        let (state, pending, count) = {
            let mut inner = self.inner.borrow_mut();
            let cycle = inner.cycle.take()?;
            let state = if cycle.attempted > 0 && cycle.failed == cycle.attempted {
                inner.error = cycle.last_error;
                SelectionState::Error
            } else {
                inner.error = None;
                SelectionState::Ready
            };
            (state, inner.pending.take(), inner.models.len())
        };
        debug!(selection = self.type_name(), %state, models = count, "load cycle finished");
        self.set_state(state);
        self.models_changed.emit(&());
        pending.and_then(|limit| self.queue_load_more(limit))
    }

    fn set_state(&self, state: SelectionState) {
        let previous = std::mem::replace(&mut self.inner.borrow_mut().state, state);
        if previous != state {
            self.state_changed.emit(&state);
        }
    }

    // -- wiring -----------------------------------------------------------

    /// Subscribe to everything that can make the held records stale: the
    /// history store and other source inputs, filter state, and
    /// `content-added` actions. Also performs the source's initial history and input reads.
    pub fn watch(self: &Rc<Self>, context: &AppContext) {
        self.source.sync_history(&context.history);
        self.source.sync_inputs();

        let mut watches = Vec::new();
        let weak: Weak<Selection> = Rc::downgrade(self);

        let history = Rc::downgrade(&context.history);
        let this = weak.clone();
        watches.push(context.history.changed().connect(move |_| {
            if let (Some(selection), Some(history)) = (this.upgrade(), history.upgrade()) {
                if selection.source.sync_history(&history) {
                    selection.mark_needs_refresh();
                }
            }
        }));

        if let Some(changed) = self.source.inputs_changed() {
            let this = weak.clone();
            watches.push(changed.connect(move |_| {
                if let Some(selection) = this.upgrade() {
                    if selection.source.sync_inputs() {
                        selection.mark_needs_refresh();
                    }
                }
            }));
        }

        for filter in &self.filters {
            if let Some(changed) = filter.changed() {
                let this = weak.clone();
                watches.push(changed.connect(move |_| {
                    if let Some(selection) = this.upgrade() {
                        selection.mark_needs_refresh();
                    }
                }));
            }
        }

        let this = weak;
        watches.push(context.dispatcher.register(move |action| {
            if let (Action::ContentAdded { .. }, Some(selection)) = (action, this.upgrade()) {
                selection.mark_needs_refresh();
            }
            Ok(())
        }));

        self.watches.borrow_mut().extend(watches);
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Selection")
            .field("source", &self.source.type_name())
            .field("state", &inner.state)
            .field("models", &inner.models.len())
            .field("dirty", &inner.dirty)
            .finish_non_exhaustive()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{QueryErrorReason, ARTICLE_TAG};
    use crate::filter::Featured;
    use crate::order::Alphabetical;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::cell::Cell;

    /// `count` indices, each a plain tag query.
    struct Indices(usize);

    impl SelectionSource for Indices {
        fn type_name(&self) -> &'static str {
            "Selection.Test"
        }

        fn query_count(&self) -> usize {
            self.0
        }

        fn build_query(&self, index: usize) -> Option<Query> {
            (index < self.0).then(|| Query::new().with_tags_match_all([format!("index-{index}")]))
        }
    }

    fn selection(indices: usize) -> Selection {
        Selection::new(Box::new(Indices(indices)), Vec::new(), None, 3)
    }

    fn page(ids: &[&str], more: bool) -> Result<QueryResults, QueryError> {
        Ok(QueryResults::new(
            ids.iter().map(|id| ContentRecord::article(*id, *id)).collect(),
            more,
        ))
    }

    fn ids(selection: &Selection) -> Vec<String> {
        selection.model_ids()
    }

    fn counter(emitter: &Emitter<()>) -> (Rc<Cell<usize>>, Subscription) {
        let count = Rc::new(Cell::new(0));
        let sub = {
            let count = Rc::clone(&count);
            emitter.connect(move |_| count.set(count.get() + 1))
        };
        (count, sub)
    }

    // ── Basic cycle ──────────────────────────────────────────────────

    #[test]
    fn single_index_cycle() {
        let s = selection(1);
        let (changes, _sub) = counter(s.models_changed());
        assert_eq!(s.state(), SelectionState::Idle);

        let req = s.queue_load_more(2).unwrap();
        assert_eq!(req.query_index, 0);
        assert_eq!(req.query.limit, 2);
        assert_eq!(req.query.offset, 0);
        assert_eq!(s.state(), SelectionState::Loading);

        assert!(s.complete(req.token, page(&["a", "b"], true)).is_none());
        assert_eq!(ids(&s), vec!["a", "b"]);
        assert_eq!(s.state(), SelectionState::Ready);
        assert_eq!(changes.get(), 1);
        assert!(!s.is_exhausted());

        let req = s.queue_load_more(2).unwrap();
        assert_eq!(req.query.offset, 2);
        s.complete(req.token, page(&["c"], false));
        assert_eq!(ids(&s), vec!["a", "b", "c"]);
        assert!(s.is_exhausted());
        assert!(s.queue_load_more(2).is_none());
    }

    #[test]
    fn zero_limit_is_a_no_op() {
        let s = selection(1);
        assert!(s.queue_load_more(0).is_none());
        assert_eq!(s.state(), SelectionState::Idle);
    }

    #[test]
    fn unfilled_page_leaves_rest_for_next_cycle() {
        let s = selection(1);
        let req = s.queue_load_more(2).unwrap();
        // Engine over-delivered; only two are wanted.
        s.complete(req.token, page(&["a", "b", "c"], false));
        assert_eq!(ids(&s), vec!["a", "b"]);
        assert!(!s.is_exhausted());
        let req = s.queue_load_more(2).unwrap();
        assert_eq!(req.query.offset, 2);
    }

    // ── Fan-out ──────────────────────────────────────────────────────

    #[test]
    fn fan_out_emits_once_per_cycle() {
        let s = selection(2);
        let (changes, _sub) = counter(s.models_changed());
        let req = s.queue_load_more(4).unwrap();
        let req = s.complete(req.token, page(&["a"], false)).unwrap();
        assert_eq!(req.query_index, 1);
        assert_eq!(req.query.limit, 3);
        assert_eq!(changes.get(), 0);
        assert!(s.complete(req.token, page(&["b"], false)).is_none());
        assert_eq!(changes.get(), 1);
        assert_eq!(ids(&s), vec!["a", "b"]);
        assert!(s.is_exhausted());
    }

    #[test]
    fn featured_split_scenario() {
        // Index 0: featured records, index 1: everything else.
        let s = Selection::new(
            Box::new(Indices(2)),
            vec![Rc::new(Featured::new(false)) as Rc<dyn Filter>],
            None,
            3,
        );
        let req = s.queue_load_more(10).unwrap();
        assert_eq!(req.query.featured, Some(true));
        assert_eq!(req.query.limit, 30);
        let first = vec![ContentRecord::article("1", "one").featured(true)];
        let req = s.complete(req.token, Ok(QueryResults::new(first, false))).unwrap();
        let second = vec![ContentRecord::article("2", "two")];
        assert!(s.complete(req.token, Ok(QueryResults::new(second, true))).is_none());

        assert_eq!(ids(&s), vec!["1"]);
        assert!(!s.is_exhausted());

        let req = s.queue_load_more(10).unwrap();
        assert_eq!(req.query_index, 1);
        assert_eq!(req.query.offset, 1);
        s.complete(req.token, page(&[], false));
        assert!(s.is_exhausted());
        assert_eq!(ids(&s), vec!["1"]);
    }

    #[test]
    fn cycle_stops_once_satisfied() {
        let s = selection(2);
        let req = s.queue_load_more(1).unwrap();
        assert!(s.complete(req.token, page(&["a"], false)).is_none());
        assert_eq!(s.state(), SelectionState::Ready);
        let req = s.queue_load_more(1).unwrap();
        assert_eq!(req.query_index, 1);
    }

    #[test]
    fn missing_query_exhausts_index() {
        struct Sparse;
        impl SelectionSource for Sparse {
            fn type_name(&self) -> &'static str {
                "Selection.Sparse"
            }
            fn query_count(&self) -> usize {
                2
            }
            fn build_query(&self, index: usize) -> Option<Query> {
                (index == 1).then(|| Query::new().with_tags_match_all([ARTICLE_TAG]))
            }
        }
        let s = Selection::new(Box::new(Sparse), Vec::new(), None, 3);
        let req = s.queue_load_more(3).unwrap();
        assert_eq!(req.query_index, 1);
        s.complete(req.token, page(&["x"], false));
        assert!(s.is_exhausted());
    }

    // ── Dedup and order ──────────────────────────────────────────────

    #[test]
    fn duplicates_across_indices_are_dropped() {
        let s = selection(2);
        let req = s.queue_load_more(10).unwrap();
        let req = s.complete(req.token, page(&["a", "b", "a"], false)).unwrap();
        s.complete(req.token, page(&["b", "c"], false));
        assert_eq!(ids(&s), vec!["a", "b", "c"]);
    }

    #[test]
    fn order_merges_stably() {
        let s = Selection::new(
            Box::new(Indices(2)),
            Vec::new(),
            Some(Rc::new(Alphabetical::new(true)) as Rc<dyn Order>),
            3,
        );
        let req = s.queue_load_more(10).unwrap();
        assert_eq!(req.query.sort, crate::content::Sort::Title);
        let batch = vec![
            ContentRecord::article("1", "pear"),
            ContentRecord::article("2", "apple"),
        ];
        let req = s.complete(req.token, Ok(QueryResults::new(batch, false))).unwrap();
        let batch = vec![
            ContentRecord::article("3", "Apple"),
            ContentRecord::article("4", "fig"),
            ContentRecord::article("5", "apple"),
        ];
        s.complete(req.token, Ok(QueryResults::new(batch, false)));
        assert_eq!(ids(&s), vec!["3", "2", "5", "4", "1"]);
    }

    proptest! {
        #[test]
        fn dedup_keeps_first_arrival(batches in proptest::collection::vec(
            proptest::collection::vec(0u8..12, 0..6), 1..6)
        ) {
            let s = selection(1);
            let mut expected: Vec<String> = Vec::new();
            for batch in batches {
                let Some(req) = s.queue_load_more(100) else { break };
                let records: Vec<_> = batch.iter().map(|n| ContentRecord::new(n.to_string())).collect();
                for r in &records {
                    if !expected.contains(&r.id) {
                        expected.push(r.id.clone());
                    }
                }
                s.complete(req.token, Ok(QueryResults::new(records, true)));
            }
            prop_assert_eq!(ids(&s), expected);
        }
    }

    // ── Coalescing and refresh ───────────────────────────────────────

    #[test]
    fn coalesces_requests_while_in_flight() {
        let s = selection(1);
        let req = s.queue_load_more(2).unwrap();
        assert!(s.queue_load_more(2).is_none());
        assert!(s.queue_load_more(5).is_none());

        let follow_up = s.complete(req.token, page(&["a", "b"], true)).unwrap();
        assert_eq!(follow_up.query.limit, 5);
        assert_eq!(follow_up.query.offset, 2);
        assert!(s.complete(follow_up.token, page(&["c"], true)).is_none());
        assert_eq!(s.state(), SelectionState::Ready);
    }

    #[test]
    fn refresh_restarts_from_zero_and_supersedes() {
        let s = selection(1);
        let (requests, _sub) = counter(s.refresh_requested());
        let req = s.queue_load_more(2).unwrap();
        s.complete(req.token, page(&["a", "b"], true));

        let stale = s.queue_load_more(2).unwrap();
        s.mark_needs_refresh();
        s.mark_needs_refresh();
        assert_eq!(requests.get(), 1);
        assert!(s.needs_refresh());

        let fresh = s.queue_load_more(2).unwrap();
        assert_eq!(fresh.query.offset, 0);
        assert!(s.is_empty());
        assert!(!s.needs_refresh());

        assert!(s.complete(stale.token, page(&["x"], true)).is_none());
        assert!(s.is_empty());
        s.complete(fresh.token, page(&["z"], true));
        assert_eq!(ids(&s), vec!["z"]);
    }

    #[test]
    fn refresh_revives_exhausted_selection() {
        let s = selection(1);
        let req = s.queue_load_more(2).unwrap();
        s.complete(req.token, page(&["a"], false));
        assert!(s.is_exhausted());
        assert!(!s.can_load_more());
        s.mark_needs_refresh();
        assert!(s.can_load_more());
        assert!(s.queue_load_more(2).is_some());
    }

    // ── Errors ───────────────────────────────────────────────────────

    fn failure() -> Result<QueryResults, QueryError> {
        Err(QueryError::new(QueryErrorReason::BackendUnavailable, "down"))
    }

    #[test]
    fn all_indices_failing_is_an_error() {
        let s = selection(2);
        let req = s.queue_load_more(2).unwrap();
        let req = s.complete(req.token, failure()).unwrap();
        s.complete(req.token, failure());
        assert_eq!(s.state(), SelectionState::Error);
        assert_eq!(s.error().unwrap().reason, QueryErrorReason::BackendUnavailable);
    }

    #[test]
    fn partial_failure_is_ready_and_retried_next_cycle() {
        let s = selection(2);
        let req = s.queue_load_more(4).unwrap();
        let req = s.complete(req.token, page(&["a"], false)).unwrap();
        assert_eq!(req.query_index, 1);
        assert!(s.complete(req.token, failure()).is_none());
        assert_eq!(s.state(), SelectionState::Ready);
        assert!(s.error().is_none());
        assert_eq!(ids(&s), vec!["a"]);

        let retry = s.queue_load_more(4).unwrap();
        assert_eq!(retry.query_index, 1);
        assert_eq!(retry.query.offset, 0);
    }

    #[test]
    fn state_changes_are_reported() {
        let s = selection(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            s.state_changed().connect(move |state| seen.borrow_mut().push(*state))
        };
        let req = s.queue_load_more(1).unwrap();
        s.complete(req.token, failure());
        let req = s.queue_load_more(1).unwrap();
        s.complete(req.token, page(&["a"], true));
        assert_eq!(
            *seen.borrow(),
            vec![
                SelectionState::Loading,
                SelectionState::Error,
                SelectionState::Loading,
                SelectionState::Ready
            ]
        );
    }
}
