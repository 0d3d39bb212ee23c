//! Layout.Box and Layout.Sidebar.

use std::any::Any;
use std::rc::Rc;

use super::Component;
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing, SlotSpec};

// ---------------------------------------------------------------------------
// Box
// ---------------------------------------------------------------------------

pub const BOX: ModuleClass = ModuleClass {
    type_name: "Layout.Box",
    capability: Capability::Component,
    slots: &[SlotSpec::many("content", Capability::Component)],
    references: &[],
    properties: &["orientation"],
    construct: construct_box,
};

fn construct_box(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let orientation = match c.str_property("orientation")?.as_deref() {
        None | Some("vertical") => Orientation::Vertical,
        Some("horizontal") => Orientation::Horizontal,
        Some(other) => {
            return Err(crate::error::ConfigError::InvalidProperty {
                module_type: BOX.type_name.to_string(),
                property: "orientation".into(),
                reason: format!("expected `vertical` or `horizontal`, found `{other}`"),
            })
        }
    };
    let content = c.components("content");
    Ok(ModuleHandle::Component(Rc::new(BoxLayout {
        orientation,
        content,
    })))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Stacks its children in one direction.
pub struct BoxLayout {
    orientation: Orientation,
    content: Vec<Rc<dyn Component>>,
}

impl BoxLayout {
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn content(&self) -> &[Rc<dyn Component>] {
        &self.content
    }
}

impl Referencing for BoxLayout {
    fn type_name(&self) -> &'static str {
        BOX.type_name
    }
}

impl Component for BoxLayout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Sidebar
// ---------------------------------------------------------------------------

pub const SIDEBAR: ModuleClass = ModuleClass {
    type_name: "Layout.Sidebar",
    capability: Capability::Component,
    slots: &[
        SlotSpec::required("sidebar", Capability::Component),
        SlotSpec::required("content", Capability::Component),
    ],
    references: &[],
    properties: &[],
    construct: construct_sidebar,
};

fn construct_sidebar(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let sidebar = c.component("sidebar")?;
    let content = c.component("content")?;
    Ok(ModuleHandle::Component(Rc::new(Sidebar { sidebar, content })))
}

/// A narrow side panel next to the main content.
pub struct Sidebar {
    sidebar: Rc<dyn Component>,
    content: Rc<dyn Component>,
}

impl Sidebar {
    pub fn sidebar(&self) -> &Rc<dyn Component> {
        &self.sidebar
    }

    pub fn content(&self) -> &Rc<dyn Component> {
        &self.content
    }
}

impl Referencing for Sidebar {
    fn type_name(&self) -> &'static str {
        SIDEBAR.type_name
    }
}

impl Component for Sidebar {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
