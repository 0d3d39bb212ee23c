//! Dispatcher: the in-process publish/subscribe action bus.
//!
//! [`Dispatcher`] keeps a FIFO of pending [`Action`]s. `dispatch` enqueues and,
//! unless a drain is already running, delivers queued actions one at a time.
//! Each action reaches every registered handler, in registration order,
//! before the next action is taken off the queue. An action dispatched from
//! inside a handler is queued behind the current one.
//!
//! A handler returning `Err` is logged and skipped; delivery continues with
//! the remaining handlers.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::action::Action;
use super::emitter::Subscription;
use crate::error::HandlerError;

type Handler = Rc<RefCell<dyn FnMut(&Action) -> Result<(), HandlerError>>>;

struct Inner {
    queue: RefCell<VecDeque<Action>>,
    handlers: RefCell<Vec<(u64, Handler)>>,
    next_id: Cell<u64>,
    draining: Cell<bool>,
    delivered: Cell<usize>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Queue-based action dispatcher. Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Rc<Inner>,
}

impl Dispatcher {
    /// Create a new dispatcher with no handlers and an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                queue: RefCell::new(VecDeque::new()),
                handlers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                draining: Cell::new(false),
                delivered: Cell::new(0),
            }),
        }
    }

    /// Register a handler. It receives every action dispatched while the
    /// returned [`Subscription`] is alive.
    pub fn register(
        &self,
        handler: impl FnMut(&Action) -> Result<(), HandlerError> + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let handler: Handler = Rc::new(RefCell::new(handler));
        self.inner.handlers.borrow_mut().push((id, handler));

        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.handlers.borrow_mut().retain(|(h, _)| *h != id);
            }
        })
    }

    /// Enqueue an action and deliver everything queued, unless a delivery is
    /// already in progress further up the stack.
    pub fn dispatch(&self, action: Action) {
        debug!(action_type = action.action_type(), "dispatch");
        self.inner.queue.borrow_mut().push_back(action);
        if self.inner.draining.get() {
            return;
        }

        let _guard = DrainGuard::enter(&self.inner.draining);
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(action) = next else { break };
            self.deliver(&action);
        }
    }

    fn deliver(&self, action: &Action) {
        let snapshot: Vec<(u64, Handler)> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .map(|(id, h)| (*id, Rc::clone(h)))
            .collect();

        for (id, handler) in snapshot {
            let registered = self.inner.handlers.borrow().iter().any(|(h, _)| *h == id);
            if !registered {
                continue;
            }
            let Ok(mut handler) = handler.try_borrow_mut() else {
                continue;
            };
            if let Err(err) = handler(action) {
                warn!(
                    action_type = action.action_type(),
                    handler = %err.handler,
                    error = %err.message,
                    "action handler failed"
                );
            }
        }
        self.inner.delivered.set(self.inner.delivered.get() + 1);
    }

    /// Number of actions waiting in the queue.
    pub fn pending_count(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.queue.borrow().is_empty()
    }

    /// Number of actions fully delivered so far.
    pub fn delivered_count(&self) -> usize {
        self.inner.delivered.get()
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending_count())
            .field("handlers", &self.handler_count())
            .field("delivered", &self.delivered_count())
            .finish()
    }
}

/// Clears the draining flag even if a handler panics.
struct DrainGuard<'a>(&'a Cell<bool>);

impl<'a> DrainGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
