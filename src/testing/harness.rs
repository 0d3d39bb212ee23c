//! Harness: programmatic interaction with a headless [`App`].
//!
//! The harness builds an app against a [`ScriptedEngine`], an in-memory
//! reading history, and a [`RecordingRenderer`], then offers user-level
//! operations (clicks, searches, history navigation, "show more") plus
//! inspection of selections and groups by id.

use std::future::Future;
use std::rc::Rc;

use tokio::task::LocalSet;

use super::scripted::{RecordingRenderer, ScriptedEngine};
use crate::app::App;
use crate::components::{ContentGroup, ListArrangement};
use crate::config::ComposeConfig;
use crate::content::{ContentRecord, MemoryReadingHistory};
use crate::error::ComposeError;
use crate::event::Action;
use crate::history::HistoryStore;
use crate::module::{Collaborators, Descriptor};
use crate::selection::Selection;

/// Run `future` on a fresh [`LocalSet`], as every loading test must.
pub async fn local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A headless app driver for tests.
///
/// # Examples
///
/// ```ignore
/// use gilt_compose::testing::{fixtures, local, Harness};
///
/// local(async {
///     let mut h = Harness::new(&fixtures::home_page(4), fixtures::library(10)).unwrap();
///     h.start();
///     h.settle().await;
///     assert_eq!(h.model_ids("featured-sel").len(), 4);
/// })
/// .await;
/// ```
pub struct Harness {
    app: App,
    engine: Rc<ScriptedEngine>,
    reading: Rc<MemoryReadingHistory>,
    renderer: Rc<RecordingRenderer>,
}

impl Harness {
    /// Build `descriptor` against a library of `records`.
    pub fn new(
        descriptor: &Descriptor,
        records: impl IntoIterator<Item = ContentRecord>,
    ) -> Result<Self, ComposeError> {
        Self::with_config(descriptor, records, ComposeConfig::default())
    }

    pub fn with_config(
        descriptor: &Descriptor,
        records: impl IntoIterator<Item = ContentRecord>,
        config: ComposeConfig,
    ) -> Result<Self, ComposeError> {
        let engine = Rc::new(ScriptedEngine::with_records(records));
        let reading = Rc::new(MemoryReadingHistory::new());
        let renderer = Rc::new(RecordingRenderer::new());
        let collaborators = Collaborators::new(engine.clone())
            .with_reading(reading.clone())
            .with_renderer(renderer.clone());
        let app = App::new(descriptor, collaborators, config)?;
        Ok(Self {
            app,
            engine,
            reading,
            renderer,
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the app's selections. Must run inside a [`LocalSet`].
    pub fn start(&mut self) -> usize {
        self.app.start()
    }

    /// Wait until every fetch has finished.
    pub async fn settle(&self) {
        self.app.settle().await;
    }

    // ── User actions ─────────────────────────────────────────────────

    pub fn dispatch(&self, action: Action) {
        self.app.dispatch(action);
    }

    pub fn click_home(&self) {
        self.dispatch(Action::HomeClicked);
    }

    pub fn click_all_sets(&self) {
        self.dispatch(Action::AllSetsClicked);
    }

    pub fn click_set(&self, set: ContentRecord) {
        self.dispatch(Action::SetClicked { model: set });
    }

    /// Click an item with the given siblings as context.
    pub fn click_item(&self, model: ContentRecord, context: Vec<ContentRecord>) {
        self.dispatch(Action::item_clicked(model, context));
    }

    /// Activate the card for `id` in the list under group `group_id`.
    pub fn click_card(&self, group_id: &str, id: &str) -> bool {
        self.arrangement(group_id).is_some_and(|list| list.activate(id))
    }

    pub fn search(&self, text: &str) {
        self.dispatch(Action::search(text));
    }

    pub fn back(&self) {
        self.dispatch(Action::HistoryBackClicked);
    }

    pub fn forward(&self) {
        self.dispatch(Action::HistoryForwardClicked);
    }

    /// Press "show more" on group `group_id`. Returns whether a fetch
    /// started.
    pub fn show_more(&self, group_id: &str) -> bool {
        self.group(group_id).is_some_and(ContentGroup::load_more)
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn engine(&self) -> &ScriptedEngine {
        &self.engine
    }

    pub fn reading(&self) -> &MemoryReadingHistory {
        &self.reading
    }

    pub fn renderer(&self) -> &RecordingRenderer {
        &self.renderer
    }

    pub fn history(&self) -> &HistoryStore {
        self.app.history()
    }

    pub fn selection(&self, id: &str) -> Option<Rc<Selection>> {
        self.app.selection(id)
    }

    /// Ids of the records selection `id` holds; empty when no such
    /// selection exists.
    pub fn model_ids(&self, id: &str) -> Vec<String> {
        self.selection(id)
            .map(|selection| selection.model_ids())
            .unwrap_or_default()
    }

    pub fn group(&self, id: &str) -> Option<&ContentGroup> {
        self.app.module(id)?.handle.downcast_component::<ContentGroup>()
    }

    /// The list arrangement of group `group_id`.
    pub fn arrangement(&self, group_id: &str) -> Option<&ListArrangement> {
        self.group(group_id)?
            .arrangement()
            .as_any()
            .downcast_ref::<ListArrangement>()
    }

    /// Ids of the cards group `group_id` currently shows.
    pub fn card_ids(&self, group_id: &str) -> Vec<String> {
        self.arrangement(group_id)
            .map(ListArrangement::card_ids)
            .unwrap_or_default()
    }

    /// The module tree outline, for snapshot assertions.
    pub fn outline(&self) -> String {
        self.app.tree().outline()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
