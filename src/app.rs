//! App struct: lifecycle for one composed application.
//!
//! [`App`] ties together a fresh [`AppContext`], the module tree built from a
//! descriptor, and the wiring that keeps selections loading. Everything runs
//! on the current thread; [`App::start`] and anything that loads content must
//! be called inside a tokio [`LocalSet`](tokio::task::LocalSet).

use std::rc::Rc;

use tracing::{debug, info};

use crate::components::ContentGroup;
use crate::config::ComposeConfig;
use crate::error::ComposeError;
use crate::event::{Action, Dispatcher, Subscription};
use crate::history::{HistoryItem, HistoryStore};
use crate::module::{
    AppContext, Collaborators, Descriptor, ModuleData, ModuleFactory, ModuleTree, Properties,
};
use crate::selection::Selection;

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// A composed application: context, module tree, and load wiring.
pub struct App {
    context: Rc<AppContext>,
    tree: ModuleTree,
    wiring: Vec<Subscription>,
    started: bool,
}

impl App {
    /// Validate `config`, build a fresh context, create the module tree and
    /// push the home page.
    ///
    /// A malformed descriptor constructs nothing and returns the first
    /// configuration error found.
    pub fn new(
        descriptor: &Descriptor,
        collaborators: Collaborators,
        config: ComposeConfig,
    ) -> Result<Self, ComposeError> {
        config.validate()?;
        let context = AppContext::new(collaborators, config);
        let factory = ModuleFactory::with_builtins();
        let tree = factory.create(&context, &descriptor.root, &Properties::new())?;
        context.history.set_current_item(HistoryItem::home());
        debug!(modules = tree.len(), "app created");
        Ok(Self {
            context,
            tree,
            wiring: Vec::new(),
            started: false,
        })
    }

    /// Parse a JSON descriptor and build an app from it.
    pub fn from_json(
        json: &str,
        collaborators: Collaborators,
        config: ComposeConfig,
    ) -> Result<Self, ComposeError> {
        let descriptor = Descriptor::from_json(json)?;
        Self::new(&descriptor, collaborators, config)
    }

    /// Connect every selection's refresh requests to the loader and issue
    /// the initial loads. Returns how many loads were started.
    ///
    /// Calling `start` again does nothing.
    pub fn start(&mut self) -> usize {
        if self.started {
            return 0;
        }
        self.started = true;

        let mut started = 0;
        for selection in self.tree.selections() {
            let page_size = self.page_size_for(&selection);
            let loader = self.context.loader.clone();
            let weak = Rc::downgrade(&selection);
            self.wiring.push(selection.refresh_requested().connect(move |_| {
                if let Some(selection) = weak.upgrade() {
                    loader.load_more(&selection, page_size);
                }
            }));
            if self.context.loader.load_more(&selection, page_size) {
                started += 1;
            }
        }
        info!(
            selections = self.wiring.len(),
            loads = started,
            modules = self.tree.len(),
            "app started"
        );
        started
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Dispatch `action` through the app's dispatcher.
    pub fn dispatch(&self, action: Action) {
        self.context.dispatcher.dispatch(action);
    }

    /// Wait until no fetch is running.
    pub async fn settle(&self) {
        self.context.loader.wait_idle().await;
    }

    pub fn tree(&self) -> &ModuleTree {
        &self.tree
    }

    pub fn context(&self) -> &Rc<AppContext> {
        &self.context
    }

    pub fn history(&self) -> &Rc<HistoryStore> {
        &self.context.history
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.context.dispatcher
    }

    pub fn config(&self) -> &ComposeConfig {
        &self.context.config
    }

    /// The module registered under `id`.
    pub fn module(&self, id: &str) -> Option<&ModuleData> {
        self.tree.by_id(id)
    }

    /// The selection registered under `id`.
    pub fn selection(&self, id: &str) -> Option<Rc<Selection>> {
        self.tree.by_id(id)?.handle.as_selection().cloned()
    }

    /// Page size for `selection`: its content group's, else the configured
    /// default.
    fn page_size_for(&self, selection: &Rc<Selection>) -> usize {
        let keys = match self.tree.root() {
            Some(root) => self.tree.walk_depth_first(root),
            None => Vec::new(),
        };
        keys.into_iter()
            .filter_map(|key| self.tree.get(key)?.handle.downcast_component::<ContentGroup>())
            .find(|group| Rc::ptr_eq(group.selection(), selection))
            .map(ContentGroup::page_size)
            .unwrap_or(self.context.config.page_size)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("modules", &self.tree.len())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentRecord, MemoryEngine};
    use crate::error::ConfigError;
    use crate::history::PageType;
    use crate::module::ModuleNode;
    use pretty_assertions::assert_eq;
    use tokio::task::LocalSet;

    fn library() -> Rc<MemoryEngine> {
        Rc::new(MemoryEngine::with_records(
            (0..12).map(|i| ContentRecord::article(format!("a{i:02}"), format!("Article {i:02}"))),
        ))
    }

    fn home(page_size: usize) -> Descriptor {
        let group = ModuleNode::new("ContentGroup.ContentGroup")
            .with_property("page_size", page_size)
            .with_slot("selection", ModuleNode::new("Selection.All").with_id("all"))
            .with_slot(
                "arrangement",
                ModuleNode::new("Arrangement.List").with_slot("card", ModuleNode::new("Card.Default")),
            );
        Descriptor::new(
            ModuleNode::new("Controller.Mesh").with_slot(
                "window",
                ModuleNode::new("Window.Simple").with_slot("content", group.with_id("group")),
            ),
        )
    }

    fn app(descriptor: &Descriptor) -> App {
        App::new(descriptor, Collaborators::new(library()), ComposeConfig::default()).unwrap()
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn new_pushes_home() {
        let app = app(&home(4));
        let item = app.history().current_item().unwrap();
        assert_eq!(item.page_type, PageType::Home);
        assert!(!app.is_started());
    }

    #[test]
    fn new_rejects_bad_descriptor() {
        let bad = Descriptor::new(ModuleNode::new("Window.Nope"));
        let err = App::new(&bad, Collaborators::new(library()), ComposeConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Config(ConfigError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn new_rejects_bad_config() {
        let config = ComposeConfig::default().with_page_size(0);
        let err = App::new(&home(4), Collaborators::new(library()), config).unwrap_err();
        assert!(matches!(err, ComposeError::Config(ConfigError::InvalidProperty { .. })));
    }

    #[test]
    fn from_json_builds_tree() {
        let json = r#"{
            "version": 2,
            "root": { "type": "Selection.All", "id": "all" }
        }"#;
        let app = App::from_json(json, Collaborators::new(library()), ComposeConfig::default()).unwrap();
        assert!(app.selection("all").is_some());
        assert_eq!(app.tree().len(), 1);
    }

    // ── start / settle ───────────────────────────────────────────────

    #[tokio::test]
    async fn start_loads_first_page() {
        LocalSet::new()
            .run_until(async {
                let mut app = app(&home(4));
                assert_eq!(app.start(), 1);
                app.settle().await;
                let all = app.selection("all").unwrap();
                assert_eq!(all.len(), 4);
                let group = app.module("group").unwrap();
                let group = group.handle.downcast_component::<ContentGroup>().unwrap();
                assert_eq!(group.page_size(), 4);
            })
            .await;
    }

    #[tokio::test]
    async fn start_is_once() {
        LocalSet::new()
            .run_until(async {
                let mut app = app(&home(4));
                app.start();
                assert_eq!(app.start(), 0);
                app.settle().await;
            })
            .await;
    }

    #[tokio::test]
    async fn content_added_reloads() {
        LocalSet::new()
            .run_until(async {
                let engine = library();
                let mut app = App::new(
                    &home(20),
                    Collaborators::new(engine.clone()),
                    ComposeConfig::default(),
                )
                .unwrap();
                app.start();
                app.settle().await;
                assert_eq!(app.selection("all").unwrap().len(), 12);

                engine.add(ContentRecord::article("new", "New"));
                app.dispatch(Action::ContentAdded { ids: vec!["new".into()] });
                app.settle().await;
                assert_eq!(app.selection("all").unwrap().len(), 13);
            })
            .await;
    }
}
