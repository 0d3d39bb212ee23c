//! Card.Default and View.Document: leaves that render one record.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::{Component, Renderer};
use crate::content::ContentRecord;
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const DEFAULT: ModuleClass = ModuleClass {
    type_name: "Card.Default",
    capability: Capability::Component,
    slots: &[],
    references: &[],
    properties: &["record"],
    construct,
};

pub const DOCUMENT: ModuleClass = ModuleClass {
    type_name: "View.Document",
    ..DEFAULT
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let card = Card::new(c.type_name(), Rc::clone(&c.context().renderer));
    if let Some(record) = c.record_property("record")? {
        card.set_record(record);
    }
    Ok(ModuleHandle::Component(Rc::new(card)))
}

pub struct Card {
    view_type: &'static str,
    renderer: Rc<dyn Renderer>,
    record: RefCell<Option<ContentRecord>>,
}

impl Card {
    pub fn new(view_type: &'static str, renderer: Rc<dyn Renderer>) -> Self {
        Self {
            view_type,
            renderer,
            record: RefCell::new(None),
        }
    }

    pub fn record(&self) -> Option<ContentRecord> {
        self.record.borrow().clone()
    }

    /// Show `record`, rendering it.
    pub fn set_record(&self, record: ContentRecord) {
        self.renderer.render(self.view_type, &record);
        *self.record.borrow_mut() = Some(record);
    }
}

impl Referencing for Card {
    fn type_name(&self) -> &'static str {
        self.view_type
    }
}

impl Component for Card {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
