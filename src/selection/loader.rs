//! Loader: runs selection fetches against the content engine.
//!
//! The loader spawns one local task per started load cycle with
//! `tokio::task::spawn_local`, so callers must be inside a
//! [`LocalSet`](tokio::task::LocalSet). A task keeps executing the requests
//! its selection hands back until the selection has nothing more to fetch or
//! the task's token goes stale.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tokio::sync::Notify;
use tracing::debug;

use super::state::{FetchRequest, Selection};
use crate::content::ContentEngine;
use crate::event::Dispatcher;
use crate::history::HistoryStore;

#[derive(Clone)]
pub struct Loader {
    engine: Rc<dyn ContentEngine>,
    active: Rc<Cell<usize>>,
    idle: Rc<Notify>,
}

impl Loader {
    pub fn new(engine: Rc<dyn ContentEngine>) -> Self {
        Self {
            engine,
            active: Rc::new(Cell::new(0)),
            idle: Rc::new(Notify::new()),
        }
    }

    pub fn engine(&self) -> &Rc<dyn ContentEngine> {
        &self.engine
    }

    /// Number of running fetch tasks.
    pub fn active(&self) -> usize {
        self.active.get()
    }

    pub fn is_idle(&self) -> bool {
        self.active() == 0
    }

    /// Queue `limit` more records on `selection`. Returns whether a new task
    /// was spawned (coalesced or exhausted requests spawn nothing).
    pub fn load_more(&self, selection: &Rc<Selection>, limit: usize) -> bool {
        match selection.queue_load_more(limit) {
            Some(request) => {
                self.spawn(Rc::clone(selection), request);
                true
            }
            None => false,
        }
    }

    /// Dispatch the selection's navigation action if it has one, otherwise
    /// paginate.
    pub fn show_more(
        &self,
        selection: &Rc<Selection>,
        limit: usize,
        dispatcher: &Dispatcher,
        history: &HistoryStore,
    ) -> bool {
        match selection.show_more_action(history) {
            Some(action) => {
                debug!(selection = selection.type_name(), action = action.action_type(), "show more navigates");
                dispatcher.dispatch(action);
                false
            }
            None => self.load_more(selection, limit),
        }
    }

    /// Execute `first` and every follow-up request on the current task.
    pub async fn drive(&self, selection: Rc<Selection>, first: FetchRequest) {
        let mut next = Some(first);
        while let Some(request) = next {
            debug!(
                selection = selection.type_name(),
                query_index = request.query_index,
                offset = request.query.offset,
                limit = request.query.limit,
                "fetching"
            );
            let outcome = self.engine.query(&request.query).await;
            next = selection.complete(request.token, outcome);
        }
    }

    /// Resolve once no fetch task is running.
    pub async fn wait_idle(&self) {
        loop {
            // Registered before the check so a wakeup in between is not lost.
            let notified = self.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn spawn(&self, selection: Rc<Selection>, request: FetchRequest) {
        self.active.set(self.active.get() + 1);
        let loader = self.clone();
        tokio::task::spawn_local(async move {
            loader.drive(selection, request).await;
            let remaining = loader.active.get().saturating_sub(1);
            loader.active.set(remaining);
            if remaining == 0 {
                loader.idle.notify_waiters();
            }
        });
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader").field("active", &self.active()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentRecord, MemoryEngine};
    use crate::history::HistoryItem;
    use crate::selection::sources::{AllContent, AllSets};
    use crate::selection::SelectionState;
    use crate::event::Action;
    use std::cell::RefCell;
    use tokio::task::LocalSet;

    fn engine(n: usize) -> Rc<MemoryEngine> {
        Rc::new(MemoryEngine::with_records(
            (0..n).map(|i| ContentRecord::article(format!("a{i:02}"), format!("Article {i}"))),
        ))
    }

    fn all(overfetch: usize) -> Rc<Selection> {
        Rc::new(Selection::new(Box::new(AllContent), Vec::new(), None, overfetch))
    }

    // ── Driving ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn loads_pages_until_exhausted() {
        let engine = engine(5);
        let loader = Loader::new(engine.clone());
        let selection = all(1);
        LocalSet::new()
            .run_until(async {
                assert!(loader.load_more(&selection, 3));
                loader.wait_idle().await;
                assert_eq!(selection.len(), 3);
                assert_eq!(selection.state(), SelectionState::Ready);

                assert!(loader.load_more(&selection, 3));
                loader.wait_idle().await;
                assert_eq!(selection.len(), 5);
                assert!(selection.is_exhausted());
                assert!(!loader.load_more(&selection, 3));
            })
            .await;
        assert_eq!(engine.queries().len(), 2);
    }

    #[tokio::test]
    async fn coalesced_requests_share_one_task() {
        let engine = engine(10);
        let loader = Loader::new(engine.clone());
        let selection = all(1);
        LocalSet::new()
            .run_until(async {
                assert!(loader.load_more(&selection, 2));
                assert!(!loader.load_more(&selection, 2));
                assert!(!loader.load_more(&selection, 2));
                assert_eq!(loader.active(), 1);
                loader.wait_idle().await;
            })
            .await;
        assert_eq!(engine.queries().len(), 2);
        assert_eq!(selection.len(), 4);
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_when_idle() {
        let loader = Loader::new(engine(0));
        tokio_test::assert_ready!(tokio_test::task::spawn(loader.wait_idle()).poll());
    }

    // ── show_more ────────────────────────────────────────────────────

    #[tokio::test]
    async fn show_more_dispatches_navigation() {
        let loader = Loader::new(engine(0));
        let dispatcher = Dispatcher::new();
        let history = HistoryStore::new();
        history.set_current_item(HistoryItem::home());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            dispatcher.register(move |action| {
                seen.borrow_mut().push(action.clone());
                Ok(())
            })
        };
        let selection = Rc::new(Selection::new(Box::new(AllSets), Vec::new(), None, 1));
        assert!(!loader.show_more(&selection, 5, &dispatcher, &history));
        assert_eq!(*seen.borrow(), vec![Action::AllSetsClicked]);
        assert_eq!(selection.state(), SelectionState::Idle);
    }
}
