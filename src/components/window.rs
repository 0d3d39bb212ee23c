//! Window.Simple: the top-level container below a controller.

use std::any::Any;
use std::rc::Rc;

use super::Component;
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing, SlotSpec};

pub const SIMPLE: ModuleClass = ModuleClass {
    type_name: "Window.Simple",
    capability: Capability::Component,
    slots: &[SlotSpec::required("content", Capability::Component)],
    references: &[],
    properties: &["title"],
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let title = c.str_property("title")?.unwrap_or_default();
    let content = c.component("content")?;
    Ok(ModuleHandle::Component(Rc::new(Window { title, content })))
}

pub struct Window {
    title: String,
    content: Rc<dyn Component>,
}

impl Window {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &Rc<dyn Component> {
        &self.content
    }
}

impl Referencing for Window {
    fn type_name(&self) -> &'static str {
        SIMPLE.type_name
    }
}

impl Component for Window {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
