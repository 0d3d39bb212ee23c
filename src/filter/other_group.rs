//! Filter.OtherGroup: hides records another selection already shows.
//!
//! Used to keep two groups on one page from repeating each other, e.g. a
//! "latest" list that skips whatever the "highlights" group above it holds.
//! The other selection is wired through the `other` reference, so it must be
//! declared earlier in the descriptor.

use std::cell::RefCell;
use std::rc::Rc;

use super::Filter;
use crate::content::{ContentRecord, Query};
use crate::error::{ConfigError, ConfigResult};
use crate::event::{Emitter, Subscription};
use crate::module::{
    Capability, Construction, ModuleClass, ModuleHandle, ReferenceSpec, Referencing,
};
use crate::selection::Selection;

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Filter.OtherGroup",
    capability: Capability::Filter,
    slots: &[],
    references: &[ReferenceSpec {
        name: "other",
        required: true,
        target: Capability::Selection,
    }],
    properties: &["invert"],
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let invert = c.bool_property("invert", false)?;
    Ok(ModuleHandle::Filter(Rc::new(OtherGroup::new(invert))))
}

pub struct OtherGroup {
    invert: bool,
    other: RefCell<Option<Rc<Selection>>>,
    changed: Emitter<()>,
    forward: RefCell<Option<Subscription>>,
}

impl OtherGroup {
    pub fn new(invert: bool) -> Self {
        Self {
            invert,
            other: RefCell::new(None),
            changed: Emitter::new(),
            forward: RefCell::new(None),
        }
    }

    /// Track `other`; `changed` fires whenever its models change.
    pub fn attach(&self, other: Rc<Selection>) {
        let changed = self.changed.clone();
        let subscription = other.models_changed().connect(move |_| changed.emit(&()));
        *self.forward.borrow_mut() = Some(subscription);
        *self.other.borrow_mut() = Some(other);
        self.changed.emit(&());
    }

    fn other(&self) -> Option<Rc<Selection>> {
        self.other.borrow().clone()
    }
}

impl Referencing for OtherGroup {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }

    fn attach_reference(&self, name: &str, target: &ModuleHandle) -> ConfigResult<()> {
        if name != "other" {
            return Err(ConfigError::UnknownReference {
                module_type: CLASS.type_name.to_string(),
                reference: name.to_string(),
            });
        }
        let selection = target
            .as_selection()
            .ok_or_else(|| ConfigError::ReferenceMismatch {
                module_type: CLASS.type_name.to_string(),
                reference: name.to_string(),
                expected: Capability::Selection.to_string(),
            })?;
        self.attach(Rc::clone(selection));
        Ok(())
    }
}

impl Filter for OtherGroup {
    fn invert(&self) -> bool {
        self.invert
    }

    fn include_impl(&self, record: &ContentRecord) -> bool {
        self.other()
            .map_or(true, |other| !other.contains(&record.id))
    }

    fn modify_query(&self, query: &Query) -> Query {
        match self.other() {
            Some(other) if !self.invert => query.clone().with_excluded_ids(other.model_ids()),
            _ => query.clone(),
        }
    }

    fn changed(&self) -> Option<&Emitter<()>> {
        Some(&self.changed)
    }
}
