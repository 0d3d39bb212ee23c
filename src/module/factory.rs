//! ModuleFactory: turns a descriptor into a live module tree.
//!
//! Construction runs in two passes over the descriptor:
//!
//! 1. [`ModuleFactory::validate`] checks the whole tree against the module
//!    classes (known types, declared slots and references, slot shapes and
//!    capabilities, id placement and uniqueness, reference order) without
//!    building anything.
//! 2. The build pass walks depth-first. For each node it builds the slot
//!    children first, in the order the class declares its slots, then calls
//!    the class constructor with the children and merged properties, inserts
//!    the module into the [`ModuleTree`], reparents the children under it,
//!    resolves its references against ids registered earlier, and finally
//!    registers its own id.
//!
//! References can therefore only point backward in construction order, and
//! two runs over the same descriptor wire their trees identically. The
//! factory itself holds no mutable state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, warn};

use super::class::{Arity, Capability, ModuleClass, ModuleHandle};
use super::context::AppContext;
use super::descriptor::{ModuleNode, Properties, SlotNode};
use super::tree::{ModuleData, ModuleKey, ModuleTree};
use super::warehouse::Warehouse;
use crate::components::Component;
use crate::content::ContentRecord;
use crate::error::{ConfigError, ConfigResult};
use crate::filter::Filter;
use crate::order::Order;
use crate::selection::Selection;

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Everything a class constructor receives: the context, the merged
/// properties, and the already-built slot contents.
pub struct Construction<'a> {
    context: &'a Rc<AppContext>,
    factory: &'a ModuleFactory,
    class: ModuleClass,
    node: &'a ModuleNode,
    properties: Properties,
    filled: BTreeMap<&'static str, Vec<ModuleHandle>>,
    templates: BTreeMap<&'static str, ModuleNode>,
}

impl<'a> Construction<'a> {
    pub fn context(&self) -> &Rc<AppContext> {
        self.context
    }

    pub fn factory(&self) -> &ModuleFactory {
        self.factory
    }

    pub fn type_name(&self) -> &'static str {
        self.class.type_name
    }

    pub fn id(&self) -> Option<&str> {
        self.node.id.as_deref()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn bool_property(&self, name: &str, default: bool) -> ConfigResult<bool> {
        self.properties.get_bool(self.type_name(), name, default)
    }

    pub fn usize_property(&self, name: &str, default: usize) -> ConfigResult<usize> {
        self.properties.get_usize(self.type_name(), name, default)
    }

    pub fn str_property(&self, name: &str) -> ConfigResult<Option<String>> {
        self.properties.get_str(self.type_name(), name)
    }

    pub fn str_list_property(&self, name: &str) -> ConfigResult<Vec<String>> {
        self.properties.get_str_list(self.type_name(), name)
    }

    pub fn record_property(&self, name: &str) -> ConfigResult<Option<ContentRecord>> {
        self.properties.get_record(self.type_name(), name)
    }

    fn take(&mut self, slot: &str) -> Vec<ModuleHandle> {
        self.filled.remove(slot).unwrap_or_default()
    }

    fn missing(&self, slot: &str) -> ConfigError {
        ConfigError::MissingSlot {
            module_type: self.type_name().to_string(),
            slot: slot.to_string(),
        }
    }

    /// The selection filling a required single slot.
    pub fn selection(&mut self, slot: &str) -> ConfigResult<Rc<Selection>> {
        self.take(slot)
            .into_iter()
            .find_map(|h| h.as_selection().cloned())
            .ok_or_else(|| self.missing(slot))
    }

    /// The component filling a required single slot.
    pub fn component(&mut self, slot: &str) -> ConfigResult<Rc<dyn Component>> {
        self.take(slot)
            .into_iter()
            .find_map(|h| h.as_component().cloned())
            .ok_or_else(|| self.missing(slot))
    }

    pub fn components(&mut self, slot: &str) -> Vec<Rc<dyn Component>> {
        self.take(slot)
            .into_iter()
            .filter_map(|h| h.as_component().cloned())
            .collect()
    }

    pub fn filters(&mut self, slot: &str) -> Vec<Rc<dyn Filter>> {
        self.take(slot)
            .into_iter()
            .filter_map(|h| h.as_filter().cloned())
            .collect()
    }

    pub fn order(&mut self, slot: &str) -> Option<Rc<dyn Order>> {
        self.take(slot)
            .into_iter()
            .find_map(|h| h.as_order().cloned())
    }

    /// The unbuilt node of a template slot.
    pub fn template(&mut self, slot: &str) -> ConfigResult<ModuleNode> {
        self.templates.remove(slot).ok_or_else(|| self.missing(slot))
    }
}

// ---------------------------------------------------------------------------
// Validation state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Validation {
    /// Every id seen so far, anywhere.
    seen: HashSet<String>,
    /// Ids of modules whose construction would already be complete.
    built: HashMap<String, Capability>,
}

#[derive(Clone, Copy, Default)]
struct Scope {
    /// Inside or below a Many or Template slot.
    multi: bool,
    /// Inside or below a Template slot.
    template: bool,
}

// ---------------------------------------------------------------------------
// ModuleFactory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ModuleFactory {
    warehouse: Rc<Warehouse>,
}

impl ModuleFactory {
    pub fn new(warehouse: Rc<Warehouse>) -> Self {
        Self { warehouse }
    }

    /// A factory over [`Warehouse::with_builtins`].
    pub fn with_builtins() -> Self {
        Self::new(Rc::new(Warehouse::with_builtins()))
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// Check `root` against the registered classes without building anything.
    pub fn validate(&self, root: &ModuleNode) -> ConfigResult<()> {
        let mut state = Validation::default();
        self.check(root, Scope::default(), &mut state)?;
        Ok(())
    }

    fn check(&self, node: &ModuleNode, scope: Scope, state: &mut Validation) -> ConfigResult<Capability> {
        let class = self.warehouse.resolve(&node.type_name)?;

        if let Some(id) = &node.id {
            if scope.multi {
                return Err(ConfigError::IdInMultiSlot { id: id.clone() });
            }
            if !state.seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateId { id: id.clone() });
            }
        }

        if let Some(name) = node.slots.keys().find(|name| class.slot(name).is_none()) {
            return Err(ConfigError::UnknownSlot {
                module_type: node.type_name.clone(),
                slot: name.clone(),
            });
        }

        for spec in class.slots {
            let Some(slot) = node.slots.get(spec.name) else {
                if spec.required {
                    return Err(ConfigError::MissingSlot {
                        module_type: node.type_name.clone(),
                        slot: spec.name.to_string(),
                    });
                }
                continue;
            };
            if slot.is_many() && spec.arity != Arity::Many {
                return Err(ConfigError::MalformedSlot {
                    module_type: node.type_name.clone(),
                    slot: spec.name.to_string(),
                    reason: "expected a single module, found a list".into(),
                });
            }
            let child_scope = Scope {
                multi: scope.multi || spec.arity != Arity::One,
                template: scope.template || spec.arity == Arity::Template,
            };
            for child in slot.nodes() {
                let capability = self.check(child, child_scope, state)?;
                if capability != spec.accepts {
                    return Err(ConfigError::MalformedSlot {
                        module_type: node.type_name.clone(),
                        slot: spec.name.to_string(),
                        reason: format!(
                            "expected a {}, found `{}` which is a {}",
                            spec.accepts, child.type_name, capability
                        ),
                    });
                }
            }
        }

        for (name, target) in &node.references {
            let spec = class.reference(name).ok_or_else(|| ConfigError::UnknownReference {
                module_type: node.type_name.clone(),
                reference: name.clone(),
            })?;
            let unresolved = || ConfigError::UnresolvedReference {
                module_type: node.type_name.clone(),
                reference: name.clone(),
                target: target.clone(),
            };
            // Template instances are built on their own, long after the ids
            // around them were registered.
            if scope.template {
                return Err(unresolved());
            }
            let found = state.built.get(target).copied().ok_or_else(unresolved)?;
            if found != spec.target {
                return Err(ConfigError::ReferenceMismatch {
                    module_type: node.type_name.clone(),
                    reference: name.clone(),
                    expected: spec.target.to_string(),
                });
            }
        }
        if let Some(spec) = class
            .references
            .iter()
            .find(|spec| spec.required && !node.references.contains_key(spec.name))
        {
            return Err(ConfigError::MissingReference {
                module_type: node.type_name.clone(),
                reference: spec.name.to_string(),
            });
        }

        if let Some(id) = &node.id {
            state.built.insert(id.clone(), class.capability);
        }
        Ok(class.capability)
    }

    /// Validate `root`, then build it into a fresh [`ModuleTree`].
    ///
    /// `extra` is merged over the root's own properties (extra wins); it is
    /// not passed down to descendants.
    pub fn create(
        &self,
        context: &Rc<AppContext>,
        root: &ModuleNode,
        extra: &Properties,
    ) -> ConfigResult<ModuleTree> {
        self.validate(root)?;
        let mut tree = ModuleTree::new();
        let key = self.build(context, root, None, "root".to_string(), Some(extra), &mut tree)?;
        tree.set_root(key);
        debug!(root = %root.type_name, modules = tree.len(), "module tree created");
        Ok(tree)
    }

    /// Build a standalone module (used for template instances) and return
    /// its handle.
    pub fn instantiate(
        &self,
        context: &Rc<AppContext>,
        node: &ModuleNode,
        extra: &Properties,
    ) -> ConfigResult<ModuleHandle> {
        let tree = self.create(context, node, extra)?;
        tree.root_handle()
            .cloned()
            .ok_or_else(|| ConfigError::malformed("root", "template produced no module"))
    }

    fn build(
        &self,
        context: &Rc<AppContext>,
        node: &ModuleNode,
        slot: Option<String>,
        path: String,
        extra: Option<&Properties>,
        tree: &mut ModuleTree,
    ) -> ConfigResult<ModuleKey> {
        let class = self.warehouse.resolve(&node.type_name)?;

        let mut children = Vec::new();
        let mut filled: BTreeMap<&'static str, Vec<ModuleHandle>> = BTreeMap::new();
        let mut templates = BTreeMap::new();
        for spec in class.slots {
            let Some(slot_node) = node.slots.get(spec.name) else {
                continue;
            };
            match (spec.arity, slot_node) {
                (Arity::Template, SlotNode::One(template)) => {
                    templates.insert(spec.name, template.as_ref().clone());
                }
                (Arity::One, SlotNode::One(child)) => {
                    let child_path = format!("{path}/{}", spec.name);
                    let key = self.build(context, child, Some(spec.name.into()), child_path, None, tree)?;
                    children.push((spec.name, key));
                }
                (Arity::Many, slot_node) => {
                    for (i, child) in slot_node.nodes().into_iter().enumerate() {
                        let child_path = format!("{path}/{}[{i}]", spec.name);
                        let key = self.build(context, child, Some(spec.name.into()), child_path, None, tree)?;
                        children.push((spec.name, key));
                    }
                }
                (_, SlotNode::Many(_)) => {
                    return Err(ConfigError::MalformedSlot {
                        module_type: node.type_name.clone(),
                        slot: spec.name.to_string(),
                        reason: "expected a single module, found a list".into(),
                    });
                }
            }
        }
        for (slot_name, key) in &children {
            if let Some(data) = tree.get(*key) {
                filled.entry(slot_name).or_default().push(data.handle.clone());
            }
        }

        let mut properties = node.properties.clone();
        if let Some(extra) = extra {
            properties.merge(extra);
        }
        for (name, _) in properties.iter() {
            if !class.accepts_property(name) {
                warn!(module_type = %node.type_name, property = %name, "ignoring unknown property");
            }
        }

        let mut construction = Construction {
            context,
            factory: self,
            class,
            node,
            properties,
            filled,
            templates,
        };
        let handle = (class.construct)(&mut construction)?;

        let key = tree.insert(ModuleData {
            type_name: node.type_name.clone(),
            id: node.id.clone(),
            slot,
            path: path.clone(),
            references: Vec::new(),
            handle: handle.clone(),
        });
        for (_, child) in children {
            tree.reparent(child, key);
        }

        let mut resolved = Vec::new();
        for (name, target) in &node.references {
            let unresolved = || ConfigError::UnresolvedReference {
                module_type: node.type_name.clone(),
                reference: name.clone(),
                target: target.clone(),
            };
            let spec = class.reference(name).ok_or_else(|| ConfigError::UnknownReference {
                module_type: node.type_name.clone(),
                reference: name.clone(),
            })?;
            let target_handle = tree
                .by_id(target)
                .map(|data| data.handle.clone())
                .ok_or_else(unresolved)?;
            if target_handle.capability() != spec.target {
                return Err(ConfigError::ReferenceMismatch {
                    module_type: node.type_name.clone(),
                    reference: name.clone(),
                    expected: spec.target.to_string(),
                });
            }
            handle.attach_reference(name, &target_handle)?;
            resolved.push((name.clone(), target.clone()));
        }
        if let Some(data) = tree.get_mut(key) {
            data.references = resolved;
        }

        if let Some(id) = &node.id {
            if !tree.register_id(id, key) {
                return Err(ConfigError::DuplicateId { id: id.clone() });
            }
        }
        debug!(module_type = %node.type_name, %path, "module constructed");
        Ok(key)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
