//! Presentation-facing modules.
//!
//! Components are the part of a module tree a toolkit would display:
//! controllers at the top, windows and layouts in the middle, and content
//! groups, arrangements and cards at the leaves. They hold no drawing code;
//! leaves hand their record to a [`Renderer`] collaborator.

pub mod arrangement;
pub mod card;
pub mod content_group;
pub mod controller;
pub mod layout;
pub mod renderer;
pub mod window;

use std::any::Any;

pub use arrangement::ListArrangement;
pub use card::Card;
pub use content_group::ContentGroup;
pub use controller::Controller;
pub use layout::{BoxLayout, Sidebar};
pub use renderer::{NullRenderer, Renderer};
pub use window::Window;

use crate::content::ContentRecord;
use crate::module::{ModuleClass, Referencing};

/// Every built-in component class.
pub const CLASSES: &[ModuleClass] = &[
    arrangement::LIST,
    card::DEFAULT,
    card::DOCUMENT,
    content_group::CLASS,
    controller::MESH,
    controller::SEQUENTIAL,
    layout::BOX,
    layout::SIDEBAR,
    window::SIMPLE,
];

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

pub trait Component: Referencing {
    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// The arrangement interface, for components that lay out cards.
    fn as_arrangement(&self) -> Option<&dyn Arrangement> {
        None
    }
}

/// A component that shows one card per record.
pub trait Arrangement {
    /// Replace the displayed records.
    fn set_models(&self, models: &[ContentRecord]);

    fn card_count(&self) -> usize;
}
