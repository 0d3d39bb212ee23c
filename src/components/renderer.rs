//! Renderer collaborator.

use crate::content::ContentRecord;

/// Draws a leaf view for a record. The engine never inspects the output.
pub trait Renderer {
    /// (Re)render the view of type `view_type` (e.g. `"Card.Default"`) from
    /// `record`.
    fn render(&self, view_type: &str, record: &ContentRecord);
}

/// Renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, _view_type: &str, _record: &ContentRecord) {}
}
