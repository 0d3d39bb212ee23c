//! Scripted collaborators: an engine whose answers a test controls, and a
//! renderer that records what it was asked to draw.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::components::Renderer;
use crate::content::{ContentEngine, ContentRecord, MemoryEngine, Query, QueryError, QueryResults};

type Outcome = Result<QueryResults, QueryError>;

enum Step {
    Answer(Outcome),
    Hold(oneshot::Receiver<Outcome>),
}

// ---------------------------------------------------------------------------
// ScriptedEngine
// ---------------------------------------------------------------------------

/// A [`ContentEngine`] that answers from a script, falling back to an
/// in-memory library once the script runs out.
///
/// Each incoming query consumes the next scripted step. [`hold`](Self::hold)
/// suspends the query until the returned [`Gate`] is released, which lets a
/// test observe a selection mid-fetch and race completions against each
/// other.
#[derive(Default)]
pub struct ScriptedEngine {
    library: MemoryEngine,
    script: RefCell<VecDeque<Step>>,
    log: RefCell<Vec<Query>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unscripted queries run against `records`.
    pub fn with_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        Self {
            library: MemoryEngine::with_records(records),
            ..Self::default()
        }
    }

    /// The fallback library.
    pub fn library(&self) -> &MemoryEngine {
        &self.library
    }

    /// Answer the next query with `results`.
    pub fn respond(&self, results: QueryResults) {
        self.script.borrow_mut().push_back(Step::Answer(Ok(results)));
    }

    /// Fail the next query with `error`.
    pub fn fail(&self, error: QueryError) {
        self.script.borrow_mut().push_back(Step::Answer(Err(error)));
    }

    /// Suspend the next query until the gate is released.
    pub fn hold(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.script.borrow_mut().push_back(Step::Hold(rx));
        Gate(tx)
    }

    /// Scripted steps not consumed yet.
    pub fn pending_steps(&self) -> usize {
        self.script.borrow().len()
    }

    /// Every query received, in arrival order.
    pub fn queries(&self) -> Vec<Query> {
        self.log.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ContentEngine for ScriptedEngine {
    async fn query(&self, query: &Query) -> Result<QueryResults, QueryError> {
        self.log.borrow_mut().push(query.clone());
        let step = self.script.borrow_mut().pop_front();
        match step {
            Some(Step::Answer(outcome)) => outcome,
            Some(Step::Hold(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(QueryError::unavailable("gate dropped"))),
            None => self.library.execute(query),
        }
    }
}

/// Releases one held query.
///
/// Dropping the gate without releasing fails the query as unavailable.
pub struct Gate(oneshot::Sender<Outcome>);

impl Gate {
    pub fn release(self, outcome: Outcome) {
        // The query may have been abandoned; nobody is left to answer then.
        let _ = self.0.send(outcome);
    }

    pub fn respond(self, results: QueryResults) {
        self.release(Ok(results));
    }

    pub fn fail(self, error: QueryError) {
        self.release(Err(error));
    }
}

// ---------------------------------------------------------------------------
// RecordingRenderer
// ---------------------------------------------------------------------------

/// A [`Renderer`] that remembers every render call.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    renders: RefCell<Vec<(String, String)>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(view_type, record id)` pairs, in call order.
    pub fn renders(&self) -> Vec<(String, String)> {
        self.renders.borrow().clone()
    }

    pub fn rendered_ids(&self) -> Vec<String> {
        self.renders.borrow().iter().map(|(_, id)| id.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.renders.borrow().len()
    }

    pub fn clear(&self) {
        self.renders.borrow_mut().clear();
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, view_type: &str, record: &ContentRecord) {
        self.renders
            .borrow_mut()
            .push((view_type.to_string(), record.id.clone()));
    }
}

// ===========================================================================
// Tests
// ===========================================================================
