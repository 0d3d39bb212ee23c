//! Module system: descriptors, classes, the warehouse, the factory and the
//! constructed tree.

pub mod class;
pub mod context;
pub mod descriptor;
pub mod factory;
pub mod tree;
pub mod warehouse;

pub use class::{
    Arity, Capability, Constructor, ModuleClass, ModuleHandle, ReferenceSpec, Referencing, SlotSpec,
};
pub use context::{AppContext, Collaborators};
pub use descriptor::{Descriptor, ModuleNode, Properties, SlotNode, DESCRIPTOR_VERSION};
pub use factory::{Construction, ModuleFactory};
pub use tree::{ModuleData, ModuleKey, ModuleTree, ShapeEntry};
pub use warehouse::{ModulePath, Warehouse};
