//! Event system: notification emitters, the action vocabulary, dispatch.

pub mod action;
pub mod dispatcher;
pub mod emitter;

pub use action::{Action, ACTION_VOCABULARY_VERSION};
pub use dispatcher::Dispatcher;
pub use emitter::{Emitter, Subscription};
