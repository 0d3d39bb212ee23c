//! Emitter<T>: single-threaded notification primitive with RAII subscriptions.
//!
//! Every stateful object in the crate (selections, the history store, filters
//! backed by mutable state) exposes its notifications as [`Emitter`]s.
//! Connecting returns a [`Subscription`]; dropping it disconnects.
//!
//! `emit` snapshots the connected callbacks before calling any of them, so a
//! callback may connect or disconnect freely. A callback that is already
//! running (re-entrant emission through a cycle of emitters) is skipped for
//! the nested emission rather than aliasing its `&mut` state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Inner<T: ?Sized> {
    next_id: Cell<u64>,
    slots: RefCell<Vec<(u64, Callback<T>)>>,
}

impl<T: ?Sized> Inner<T> {
    fn is_connected(&self, id: u64) -> bool {
        self.slots.borrow().iter().any(|(slot, _)| *slot == id)
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// A list of callbacks notified with `&T`.
///
/// Cloning an `Emitter` yields another handle to the same callback list.
pub struct Emitter<T: ?Sized + 'static> {
    inner: Rc<Inner<T>>,
}

impl<T: ?Sized + 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                next_id: Cell::new(0),
                slots: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Connect a callback. It stays connected until the returned
    /// [`Subscription`] is dropped.
    pub fn connect(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        self.inner.slots.borrow_mut().push((id, callback));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.slots.borrow_mut().retain(|(slot, _)| *slot != id);
            }
        })
    }

    /// Notify every connected callback, in connection order.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = self
            .inner
            .slots
            .borrow()
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            // Disconnected by an earlier callback in this same emission.
            if !self.inner.is_connected(id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut f) => f(value),
                Err(_) => tracing::trace!(slot = id, "skipping re-entrant emitter callback"),
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}

impl<T: ?Sized + 'static> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized + 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Connection handle. Dropping it disconnects the callback.
#[must_use = "dropping a Subscription disconnects it immediately"]
pub struct Subscription {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(disconnect: impl FnOnce() + 'static) -> Self {
        Self {
            disconnect: Some(Box::new(disconnect)),
        }
    }

    /// A subscription connected to nothing.
    pub fn empty() -> Self {
        Self { disconnect: None }
    }

    /// Disconnect now. Equivalent to dropping.
    pub fn cancel(mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }

    /// Keep the callback connected for as long as its source lives.
    pub fn detach(mut self) {
        self.disconnect = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl FnMut(&T) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |v: &T| sink.borrow_mut().push(v.clone()))
    }

    // ── Connect / emit ───────────────────────────────────────────────

    #[test]
    fn emit_reaches_subscribers_in_order() {
        let emitter = Emitter::<u32>::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::clone(&order);
        let b = Rc::clone(&order);
        let _s1 = emitter.connect(move |v| a.borrow_mut().push(("a", *v)));
        let _s2 = emitter.connect(move |v| b.borrow_mut().push(("b", *v)));

        emitter.emit(&7);
        assert_eq!(*order.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn emit_without_subscribers_is_noop() {
        let emitter = Emitter::<()>::new();
        emitter.emit(&());
        assert!(!emitter.has_subscribers());
    }

    #[test]
    fn clones_share_callbacks() {
        let emitter = Emitter::<u8>::new();
        let (log, cb) = recorder();
        let _s = emitter.connect(cb);
        emitter.clone().emit(&1);
        assert_eq!(*log.borrow(), vec![1]);
    }

    // ── Subscription lifetime ────────────────────────────────────────

    #[test]
    fn drop_disconnects() {
        let emitter = Emitter::<u8>::new();
        let (log, cb) = recorder();
        let sub = emitter.connect(cb);
        emitter.emit(&1);
        drop(sub);
        emitter.emit(&2);
        assert_eq!(*log.borrow(), vec![1]);
        assert_eq!(emitter.subscriber_count(), 0);
    }

    #[test]
    fn detach_keeps_connection() {
        let emitter = Emitter::<u8>::new();
        let (log, cb) = recorder();
        emitter.connect(cb).detach();
        emitter.emit(&3);
        assert_eq!(*log.borrow(), vec![3]);
    }

    #[test]
    fn subscription_outliving_emitter_is_harmless() {
        let emitter = Emitter::<u8>::new();
        let sub = emitter.connect(|_| {});
        drop(emitter);
        drop(sub);
    }

    #[test]
    fn disconnect_during_emit_skips_later_callback() {
        let emitter = Emitter::<()>::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let v = Rc::clone(&victim);
        let _killer = emitter.connect(move |_| {
            v.borrow_mut().take();
        });
        let h = Rc::clone(&hits);
        *victim.borrow_mut() = Some(emitter.connect(move |_| h.set(h.get() + 1)));

        emitter.emit(&());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn reentrant_emit_skips_running_callback() {
        let emitter = Emitter::<u8>::new();
        let hits = Rc::new(Cell::new(0));
        let inner = emitter.clone();
        let h = Rc::clone(&hits);
        let _s = emitter.connect(move |v| {
            h.set(h.get() + 1);
            if *v == 0 {
                inner.emit(&1);
            }
        });
        emitter.emit(&0);
        assert_eq!(hits.get(), 1);
    }
}
