//! ModuleTree: slotmap arena holding a constructed module graph.
//!
//! All modules live in a single `SlotMap`. Parent/child relationships are
//! stored in secondary maps. The factory inserts modules as orphans (children
//! are built before their parent) and reparents them once the parent exists.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use slotmap::{new_key_type, SecondaryMap, SlotMap};

use super::class::ModuleHandle;
use crate::selection::Selection;

new_key_type! {
    /// Identifies a module inside a [`ModuleTree`].
    pub struct ModuleKey;
}

const EMPTY_CHILDREN: &[ModuleKey] = &[];

/// One constructed module and its position in the descriptor.
#[derive(Debug, Clone)]
pub struct ModuleData {
    pub type_name: String,
    pub id: Option<String>,
    /// The slot of the parent this module fills; `None` for the root.
    pub slot: Option<String>,
    /// Descriptor path, e.g. `root/window/content[1]`.
    pub path: String,
    /// Resolved references: name and target id.
    pub references: Vec<(String, String)>,
    pub handle: ModuleHandle,
}

/// Structural fingerprint of one module, used to compare two trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeEntry {
    pub depth: usize,
    pub type_name: String,
    pub id: Option<String>,
    pub slot: Option<String>,
    pub references: Vec<(String, String)>,
}

pub struct ModuleTree {
    nodes: SlotMap<ModuleKey, ModuleData>,
    children: SecondaryMap<ModuleKey, Vec<ModuleKey>>,
    parent: SecondaryMap<ModuleKey, ModuleKey>,
    root: Option<ModuleKey>,
    ids: HashMap<String, ModuleKey>,
    paths: HashMap<String, ModuleKey>,
}

impl ModuleTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
            ids: HashMap::new(),
            paths: HashMap::new(),
        }
    }

    /// Insert a module with no parent.
    pub fn insert(&mut self, data: ModuleData) -> ModuleKey {
        let path = data.path.clone();
        let key = self.nodes.insert(data);
        self.children.insert(key, Vec::new());
        self.paths.insert(path, key);
        key
    }

    /// Make `node` the last child of `new_parent`, detaching it from any
    /// previous parent.
    pub fn reparent(&mut self, node: ModuleKey, new_parent: ModuleKey) {
        if !self.nodes.contains_key(node) || !self.nodes.contains_key(new_parent) {
            return;
        }
        if let Some(old_parent) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.retain(|&child| child != node);
            }
        }
        self.parent.insert(node, new_parent);
        if let Some(kids) = self.children.get_mut(new_parent) {
            kids.push(node);
        }
    }

    /// Record `id` as naming `key`. Returns `false` if the id is taken.
    pub(crate) fn register_id(&mut self, id: &str, key: ModuleKey) -> bool {
        if self.ids.contains_key(id) {
            return false;
        }
        self.ids.insert(id.to_string(), key);
        true
    }

    pub fn set_root(&mut self, key: ModuleKey) {
        self.root = Some(key);
    }

    pub fn root(&self) -> Option<ModuleKey> {
        self.root
    }

    pub fn root_handle(&self) -> Option<&ModuleHandle> {
        self.root.and_then(|r| self.get(r)).map(|d| &d.handle)
    }

    pub fn get(&self, key: ModuleKey) -> Option<&ModuleData> {
        self.nodes.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: ModuleKey) -> Option<&mut ModuleData> {
        self.nodes.get_mut(key)
    }

    pub fn parent(&self, key: ModuleKey) -> Option<ModuleKey> {
        self.parent.get(key).copied()
    }

    pub fn children(&self, key: ModuleKey) -> &[ModuleKey] {
        self.children
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: ModuleKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn key_by_id(&self, id: &str) -> Option<ModuleKey> {
        self.ids.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&ModuleData> {
        self.key_by_id(id).and_then(|k| self.get(k))
    }

    pub fn by_path(&self, path: &str) -> Option<&ModuleData> {
        self.paths.get(path).and_then(|k| self.get(*k))
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: ModuleKey) -> Vec<ModuleKey> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    fn walk_with_depth(&self) -> Vec<(usize, ModuleKey)> {
        let mut result = Vec::new();
        let Some(root) = self.root else {
            return result;
        };
        let mut stack = vec![(0, root)];
        while let Some((depth, current)) = stack.pop() {
            result.push((depth, current));
            for &child in self.children(current).iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        result
    }

    /// Every selection in the tree, in depth-first order.
    pub fn selections(&self) -> Vec<Rc<Selection>> {
        self.walk_with_depth()
            .into_iter()
            .filter_map(|(_, key)| self.get(key)?.handle.as_selection().cloned())
            .collect()
    }

    /// Structural fingerprint: slot structure and reference wiring, in
    /// depth-first order.
    pub fn shape(&self) -> Vec<ShapeEntry> {
        self.walk_with_depth()
            .into_iter()
            .filter_map(|(depth, key)| {
                let data = self.get(key)?;
                Some(ShapeEntry {
                    depth,
                    type_name: data.type_name.clone(),
                    id: data.id.clone(),
                    slot: data.slot.clone(),
                    references: data.references.clone(),
                })
            })
            .collect()
    }

    /// Indented text rendering of the tree, one module per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for entry in self.shape() {
            let indent = "  ".repeat(entry.depth);
            let _ = write!(out, "{indent}");
            if let Some(slot) = &entry.slot {
                let _ = write!(out, "{slot}: ");
            }
            let _ = write!(out, "{}", entry.type_name);
            if let Some(id) = &entry.id {
                let _ = write!(out, " #{id}");
            }
            for (name, target) in &entry.references {
                let _ = write!(out, " &{name}={target}");
            }
            out.push('\n');
        }
        out
    }
}

impl Default for ModuleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModuleTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTree")
            .field("len", &self.len())
            .field("root", &self.root)
            .finish()
    }
}
