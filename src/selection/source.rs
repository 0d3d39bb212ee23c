//! SelectionSource: what a selection asks the engine for.

use crate::content::Query;
use crate::event::{Action, Emitter};
use crate::history::HistoryStore;

/// The per-type half of a selection.
///
/// A source declares how many underlying queries one logical selection
/// issues and builds each of them. The selection adds paging, filters and the
/// order on top.
///
/// Sources that depend on navigation state read the [`HistoryStore`] only in
/// [`sync_history`](SelectionSource::sync_history), which the selection calls
/// once at construction and then from the store's `changed` notification.
pub trait SelectionSource {
    fn type_name(&self) -> &'static str;

    /// Number of underlying query indices. Fixed for the source's lifetime.
    fn query_count(&self) -> usize;

    /// The query for `index`, without offset or limit. `None` means the
    /// index has nothing to fetch right now and counts as drained.
    fn build_query(&self, index: usize) -> Option<Query>;

    /// Re-read the history facets this source depends on. Returns `true`
    /// when they changed, which marks the selection for refresh.
    fn sync_history(&self, _history: &HistoryStore) -> bool {
        false
    }

    /// Notification for an input other than history, such as the reading
    /// history. The selection calls [`sync_inputs`](SelectionSource::sync_inputs)
    /// whenever it fires.
    fn inputs_changed(&self) -> Option<&Emitter<()>> {
        None
    }

    /// Re-read the inputs behind [`inputs_changed`](SelectionSource::inputs_changed).
    /// Returns `true` when the queries changed, which marks the selection
    /// for refresh. Queries must not change outside this call, or paging
    /// cursors would point into a different result set.
    fn sync_inputs(&self) -> bool {
        false
    }

    /// A navigation action to dispatch instead of paginating.
    fn show_more(&self, _history: &HistoryStore) -> Option<Action> {
        None
    }
}
