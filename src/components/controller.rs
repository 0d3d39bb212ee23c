//! Controller.Mesh and Controller.Sequential: the root of an application.
//!
//! A controller owns the window and installs a navigation policy that turns
//! dispatched actions into history transitions for as long as it lives.

use std::any::Any;
use std::rc::Rc;

use super::Component;
use crate::error::ConfigResult;
use crate::event::Subscription;
use crate::history::{self, NavigationPolicy};
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing, SlotSpec};

const SLOTS: &[SlotSpec] = &[SlotSpec::required("window", Capability::Component)];

pub const MESH: ModuleClass = ModuleClass {
    type_name: "Controller.Mesh",
    capability: Capability::Component,
    slots: SLOTS,
    references: &[],
    properties: &[],
    construct: construct_mesh,
};

pub const SEQUENTIAL: ModuleClass = ModuleClass {
    type_name: "Controller.Sequential",
    construct: construct_sequential,
    ..MESH
};

fn construct_mesh(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    construct(c, NavigationPolicy::Mesh)
}

fn construct_sequential(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    construct(c, NavigationPolicy::Sequential)
}

fn construct(c: &mut Construction<'_>, policy: NavigationPolicy) -> ConfigResult<ModuleHandle> {
    let window = c.component("window")?;
    let context = c.context();
    let subscription = history::install(
        policy,
        &context.dispatcher,
        Rc::clone(&context.history),
        Rc::clone(&context.reading),
    );
    Ok(ModuleHandle::Component(Rc::new(Controller {
        type_name: c.type_name(),
        policy,
        window,
        _navigation: subscription,
    })))
}

pub struct Controller {
    type_name: &'static str,
    policy: NavigationPolicy,
    window: Rc<dyn Component>,
    _navigation: Subscription,
}

impl Controller {
    pub fn policy(&self) -> NavigationPolicy {
        self.policy
    }

    pub fn window(&self) -> &Rc<dyn Component> {
        &self.window
    }
}

impl Referencing for Controller {
    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Component for Controller {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
