//! AppContext: the collaborators a module tree is constructed against.
//!
//! One context exists per application instance. Nothing in the crate reaches
//! for process-wide state; the factory hands the context to every
//! constructor, and tests build a fresh one each time.

use std::rc::Rc;

use crate::components::{NullRenderer, Renderer};
use crate::config::ComposeConfig;
use crate::content::{ContentEngine, MemoryReadingHistory, ReadingHistory};
use crate::event::Dispatcher;
use crate::history::HistoryStore;
use crate::selection::Loader;

/// External collaborators supplied by the embedding application.
#[derive(Clone)]
pub struct Collaborators {
    pub engine: Rc<dyn ContentEngine>,
    pub reading: Rc<dyn ReadingHistory>,
    pub renderer: Rc<dyn Renderer>,
}

impl Collaborators {
    /// Collaborators with in-memory reading history and no rendering.
    pub fn new(engine: Rc<dyn ContentEngine>) -> Self {
        Self {
            engine,
            reading: Rc::new(MemoryReadingHistory::new()),
            renderer: Rc::new(NullRenderer),
        }
    }

    pub fn with_reading(mut self, reading: Rc<dyn ReadingHistory>) -> Self {
        self.reading = reading;
        self
    }

    pub fn with_renderer(mut self, renderer: Rc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

/// Shared state and services for one module tree.
pub struct AppContext {
    pub dispatcher: Dispatcher,
    pub history: Rc<HistoryStore>,
    pub engine: Rc<dyn ContentEngine>,
    pub reading: Rc<dyn ReadingHistory>,
    pub renderer: Rc<dyn Renderer>,
    pub loader: Loader,
    pub config: ComposeConfig,
}

impl AppContext {
    /// A fresh context: new dispatcher, new history store.
    pub fn new(collaborators: Collaborators, config: ComposeConfig) -> Rc<Self> {
        let loader = Loader::new(Rc::clone(&collaborators.engine));
        Rc::new(Self {
            dispatcher: Dispatcher::new(),
            history: Rc::new(HistoryStore::with_depth(config.history_depth)),
            engine: collaborators.engine,
            reading: collaborators.reading,
            renderer: collaborators.renderer,
            loader,
            config,
        })
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
