//! Module classes: the static description of a constructible module type.
//!
//! Every module type declares one [`ModuleClass`] constant: its type name,
//! the capability it provides, its slots in construction order, the
//! references it accepts, the properties it understands, and a constructor.
//! The factory reads only this table, so capability checks happen against
//! declared data instead of runtime probing.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::factory::Construction;
use crate::components::Component;
use crate::error::{ConfigError, ConfigResult};
use crate::filter::Filter;
use crate::order::Order;
use crate::selection::Selection;

/// What a constructed module can be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Selection,
    Filter,
    Order,
    Component,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Selection => "selection",
            Capability::Filter => "filter",
            Capability::Order => "order",
            Capability::Component => "component",
        };
        f.write_str(s)
    }
}

/// How many modules a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one module, built with its parent.
    One,
    /// An ordered list of modules, possibly empty.
    Many,
    /// A node kept unbuilt; the owner instantiates it on demand, once per
    /// content record.
    Template,
}

/// A named extension point on a module type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub required: bool,
    /// Capability the slot's modules must provide.
    pub accepts: Capability,
}

impl SlotSpec {
    pub const fn required(name: &'static str, accepts: Capability) -> Self {
        Self {
            name,
            arity: Arity::One,
            required: true,
            accepts,
        }
    }

    pub const fn optional(name: &'static str, accepts: Capability) -> Self {
        Self {
            name,
            arity: Arity::One,
            required: false,
            accepts,
        }
    }

    pub const fn many(name: &'static str, accepts: Capability) -> Self {
        Self {
            name,
            arity: Arity::Many,
            required: false,
            accepts,
        }
    }

    pub const fn template(name: &'static str, accepts: Capability) -> Self {
        Self {
            name,
            arity: Arity::Template,
            required: true,
            accepts,
        }
    }
}

/// A named cross-reference to another module, resolved after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpec {
    pub name: &'static str,
    pub required: bool,
    pub target: Capability,
}

/// Builds a module from its resolved construction inputs.
pub type Constructor = fn(&mut Construction<'_>) -> ConfigResult<ModuleHandle>;

/// The static description of a module type.
#[derive(Clone, Copy)]
pub struct ModuleClass {
    pub type_name: &'static str,
    pub capability: Capability,
    /// Slots, in construction order.
    pub slots: &'static [SlotSpec],
    pub references: &'static [ReferenceSpec],
    pub properties: &'static [&'static str],
    pub construct: Constructor,
}

impl ModuleClass {
    pub fn slot(&self, name: &str) -> Option<&SlotSpec> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn reference(&self, name: &str) -> Option<&ReferenceSpec> {
        self.references.iter().find(|r| r.name == name)
    }

    pub fn accepts_property(&self, name: &str) -> bool {
        self.properties.contains(&name)
    }
}

impl fmt::Debug for ModuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleClass")
            .field("type_name", &self.type_name)
            .field("capability", &self.capability)
            .field("slots", &self.slots)
            .field("references", &self.references)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Referencing
// ---------------------------------------------------------------------------

/// Modules that accept named cross-references.
///
/// The factory only calls `attach_reference` for names the module's class
/// declares, with a target whose capability matches the declaration.
pub trait Referencing {
    fn type_name(&self) -> &'static str;

    fn attach_reference(&self, name: &str, _target: &ModuleHandle) -> ConfigResult<()> {
        Err(ConfigError::UnknownReference {
            module_type: self.type_name().to_string(),
            reference: name.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// ModuleHandle
// ---------------------------------------------------------------------------

/// A live module, by capability.
#[derive(Clone)]
pub enum ModuleHandle {
    Selection(Rc<Selection>),
    Filter(Rc<dyn Filter>),
    Order(Rc<dyn Order>),
    Component(Rc<dyn Component>),
}

impl ModuleHandle {
    pub fn capability(&self) -> Capability {
        match self {
            ModuleHandle::Selection(_) => Capability::Selection,
            ModuleHandle::Filter(_) => Capability::Filter,
            ModuleHandle::Order(_) => Capability::Order,
            ModuleHandle::Component(_) => Capability::Component,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ModuleHandle::Selection(s) => s.type_name(),
            ModuleHandle::Filter(f) => f.type_name(),
            ModuleHandle::Order(o) => o.type_name(),
            ModuleHandle::Component(c) => c.type_name(),
        }
    }

    pub fn as_selection(&self) -> Option<&Rc<Selection>> {
        match self {
            ModuleHandle::Selection(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> Option<&Rc<dyn Filter>> {
        match self {
            ModuleHandle::Filter(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_order(&self) -> Option<&Rc<dyn Order>> {
        match self {
            ModuleHandle::Order(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Rc<dyn Component>> {
        match self {
            ModuleHandle::Component(c) => Some(c),
            _ => None,
        }
    }

    /// Downcast a component to its concrete type.
    pub fn downcast_component<T: Any>(&self) -> Option<&T> {
        self.as_component()?.as_any().downcast_ref::<T>()
    }

    /// Forward a resolved reference to the module.
    pub(crate) fn attach_reference(&self, name: &str, target: &ModuleHandle) -> ConfigResult<()> {
        match self {
            ModuleHandle::Filter(f) => f.attach_reference(name, target),
            ModuleHandle::Component(c) => c.attach_reference(name, target),
            ModuleHandle::Selection(_) | ModuleHandle::Order(_) => {
                Err(ConfigError::UnknownReference {
                    module_type: self.type_name().to_string(),
                    reference: name.to_string(),
                })
            }
        }
    }

    /// Whether two handles point at the same module.
    pub fn ptr_eq(&self, other: &ModuleHandle) -> bool {
        match (self, other) {
            (ModuleHandle::Selection(a), ModuleHandle::Selection(b)) => Rc::ptr_eq(a, b),
            (ModuleHandle::Filter(a), ModuleHandle::Filter(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (ModuleHandle::Order(a), ModuleHandle::Order(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (ModuleHandle::Component(a), ModuleHandle::Component(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleHandle::{:?}({})", self.capability(), self.type_name())
    }
}
