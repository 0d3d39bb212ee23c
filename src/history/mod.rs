//! Navigation state: history items, the history store, navigation policies.

pub mod controller;
pub mod item;
pub mod store;

pub use controller::{install, NavigationPolicy};
pub use item::{Direction, HistoryItem, PageType};
pub use store::{HistoryStore, DEFAULT_HISTORY_DEPTH};
