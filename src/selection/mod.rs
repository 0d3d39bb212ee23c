//! Selections: paginated, filtered, ordered views over the content engine.

pub mod classes;
pub mod loader;
pub mod source;
pub mod sources;
pub mod state;

pub use loader::Loader;
pub use source::SelectionSource;
pub use state::{FetchRequest, FetchToken, Selection, SelectionState};

use crate::module::ModuleClass;

/// Every built-in selection class.
pub const CLASSES: &[ModuleClass] = &[
    classes::ALL,
    classes::ALL_SETS,
    classes::CONTENT_FOR_SET,
    classes::FEATURED,
    classes::NEXT,
    classes::PREVIOUS,
    classes::RELATED,
    classes::SEARCH,
    classes::STATIC,
    classes::SUPPLEMENTARY,
];
