//! Application descriptor model and JSON parsing.
//!
//! A descriptor is a JSON document:
//!
//! ```json
//! {
//!   "version": 2,
//!   "root": {
//!     "type": "Controller.Mesh",
//!     "slots": { "window": "main-window" }
//!   },
//!   "modules": {
//!     "main-window": { "type": "Window.Simple", "slots": { "content": { "type": "Layout.Box" } } }
//!   }
//! }
//! ```
//!
//! Each node has a `type`, and optionally an `id`, `properties`, `slots`,
//! and `references`. A slot value is a node, an array of nodes, or a string
//! naming an entry of `modules`, which is expanded in place. Parsing is
//! strict: anything outside this shape is a [`ConfigError`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::content::ContentRecord;
use crate::error::{ConfigError, ConfigResult};

/// The only descriptor format version understood.
pub const DESCRIPTOR_VERSION: u64 = 2;

const NODE_KEYS: &[&str] = &["type", "id", "properties", "slots", "references"];

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// A module's property bag: string keys to JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Map<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlay `other` onto `self`; keys in `other` win.
    pub fn merge(&mut self, other: &Properties) {
        for (k, v) in other.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    fn invalid(module_type: &str, property: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidProperty {
            module_type: module_type.to_string(),
            property: property.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn get_bool(&self, module_type: &str, name: &str, default: bool) -> ConfigResult<bool> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(Self::invalid(module_type, name, "expected a boolean")),
        }
    }

    pub fn get_usize(&self, module_type: &str, name: &str, default: usize) -> ConfigResult<usize> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| Self::invalid(module_type, name, "expected a non-negative integer")),
            Some(_) => Err(Self::invalid(module_type, name, "expected a non-negative integer")),
        }
    }

    pub fn get_str(&self, module_type: &str, name: &str) -> ConfigResult<Option<String>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(Self::invalid(module_type, name, "expected a string")),
        }
    }

    pub fn get_str_list(&self, module_type: &str, name: &str) -> ConfigResult<Vec<String>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| Self::invalid(module_type, name, "expected a list of strings"))
                })
                .collect(),
            Some(_) => Err(Self::invalid(module_type, name, "expected a list of strings")),
        }
    }

    pub fn get_record(&self, module_type: &str, name: &str) -> ConfigResult<Option<ContentRecord>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Self::invalid(module_type, name, &e.to_string())),
        }
    }
}

impl From<Map<String, Value>> for Properties {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// ModuleNode
// ---------------------------------------------------------------------------

/// The content of one slot: a single node or an ordered list.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotNode {
    One(Box<ModuleNode>),
    Many(Vec<ModuleNode>),
}

impl SlotNode {
    pub fn nodes(&self) -> Vec<&ModuleNode> {
        match self {
            SlotNode::One(node) => vec![node.as_ref()],
            SlotNode::Many(nodes) => nodes.iter().collect(),
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, SlotNode::Many(_))
    }
}

/// A read-only node of the descriptor tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    pub type_name: String,
    pub id: Option<String>,
    pub properties: Properties,
    pub slots: BTreeMap<String, SlotNode>,
    /// Reference name to target module id.
    pub references: BTreeMap<String, String>,
}

impl ModuleNode {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
            properties: Properties::new(),
            slots: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// Fill `slot` with `node`. Filling the same slot again turns it into a list.
    pub fn with_slot(mut self, slot: impl Into<String>, node: ModuleNode) -> Self {
        let slot = slot.into();
        let next = match self.slots.remove(&slot) {
            None => SlotNode::One(Box::new(node)),
            Some(SlotNode::One(first)) => SlotNode::Many(vec![*first, node]),
            Some(SlotNode::Many(mut nodes)) => {
                nodes.push(node);
                SlotNode::Many(nodes)
            }
        };
        self.slots.insert(slot, next);
        self
    }

    /// Append `node` to the list in `slot`, creating the list if needed.
    pub fn with_slot_item(mut self, slot: impl Into<String>, node: ModuleNode) -> Self {
        let slot = slot.into();
        let next = match self.slots.remove(&slot) {
            None => SlotNode::Many(vec![node]),
            Some(SlotNode::One(first)) => SlotNode::Many(vec![*first, node]),
            Some(SlotNode::Many(mut nodes)) => {
                nodes.push(node);
                SlotNode::Many(nodes)
            }
        };
        self.slots.insert(slot, next);
        self
    }

    pub fn with_slot_list(mut self, slot: impl Into<String>, nodes: Vec<ModuleNode>) -> Self {
        self.slots.insert(slot.into(), SlotNode::Many(nodes));
        self
    }

    pub fn with_reference(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.references.insert(name.into(), target.into());
        self
    }

    /// Parse a standalone node (no named-module table).
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        Parser::new(&Map::new()).node(value, "root")
    }

    /// Serialize back to descriptor JSON.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.type_name.clone()));
        if let Some(id) = &self.id {
            obj.insert("id".into(), Value::String(id.clone()));
        }
        if !self.properties.is_empty() {
            obj.insert("properties".into(), Value::Object(self.properties.0.clone()));
        }
        if !self.slots.is_empty() {
            let slots = self
                .slots
                .iter()
                .map(|(name, slot)| {
                    let v = match slot {
                        SlotNode::One(node) => node.to_value(),
                        SlotNode::Many(nodes) => {
                            Value::Array(nodes.iter().map(ModuleNode::to_value).collect())
                        }
                    };
                    (name.clone(), v)
                })
                .collect();
            obj.insert("slots".into(), Value::Object(slots));
        }
        if !self.references.is_empty() {
            let refs = self
                .references
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            obj.insert("references".into(), Value::Object(refs));
        }
        Value::Object(obj)
    }

    /// Every node in this subtree, pre-order.
    pub fn descendants(&self) -> Vec<&ModuleNode> {
        let mut out = vec![self];
        for slot in self.slots.values() {
            for child in slot.nodes() {
                out.extend(child.descendants());
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// A parsed application descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub version: u64,
    pub root: ModuleNode,
}

impl Descriptor {
    pub fn new(root: ModuleNode) -> Self {
        Self {
            version: DESCRIPTOR_VERSION,
            root,
        }
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigError::malformed("$", "descriptor must be an object"))?;

        let version = match obj.get("version") {
            Some(v) => v
                .as_u64()
                .ok_or_else(|| ConfigError::malformed("version", "expected an integer"))?,
            None => return Err(ConfigError::malformed("version", "missing")),
        };
        if version != DESCRIPTOR_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                expected: DESCRIPTOR_VERSION,
            });
        }

        let empty = Map::new();
        let modules = match obj.get("modules") {
            None => &empty,
            Some(Value::Object(m)) => m,
            Some(_) => return Err(ConfigError::malformed("modules", "expected an object")),
        };
        let root = obj
            .get("root")
            .ok_or_else(|| ConfigError::malformed("root", "missing"))?;

        let root = Parser::new(modules).node(root, "root")?;
        Ok(Self { version, root })
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "version": self.version,
            "root": self.root.to_value(),
        })
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    modules: &'a Map<String, Value>,
    /// Named modules currently being expanded, for cycle detection.
    expanding: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(modules: &'a Map<String, Value>) -> Self {
        Self {
            modules,
            expanding: Vec::new(),
        }
    }

    fn node(&mut self, value: &Value, at: &str) -> ConfigResult<ModuleNode> {
        match value {
            Value::String(name) => self.named(name, at),
            Value::Object(obj) => self.object(obj, at),
            _ => Err(ConfigError::malformed(at, "expected a module object or a module name")),
        }
    }

    fn named(&mut self, name: &str, at: &str) -> ConfigResult<ModuleNode> {
        if self.expanding.iter().any(|n| n == name) {
            return Err(ConfigError::malformed(at, format!("module `{name}` includes itself")));
        }
        let value = self
            .modules
            .get(name)
            .ok_or_else(|| ConfigError::malformed(at, format!("no module named `{name}`")))?;
        self.expanding.push(name.to_string());
        let result = self.node(value, &format!("modules.{name}"));
        self.expanding.pop();
        result
    }

    fn object(&mut self, obj: &Map<String, Value>, at: &str) -> ConfigResult<ModuleNode> {
        if let Some(key) = obj.keys().find(|k| !NODE_KEYS.contains(&k.as_str())) {
            return Err(ConfigError::malformed(at, format!("unexpected key `{key}`")));
        }

        let type_name = match obj.get("type") {
            Some(Value::String(t)) if !t.is_empty() => t.clone(),
            Some(_) => return Err(ConfigError::malformed(at, "`type` must be a non-empty string")),
            None => return Err(ConfigError::malformed(at, "missing `type`")),
        };
        let mut node = ModuleNode::new(type_name);

        match obj.get("id") {
            None => {}
            Some(Value::String(id)) => node.id = Some(id.clone()),
            Some(_) => return Err(ConfigError::malformed(at, "`id` must be a string")),
        }

        match obj.get("properties") {
            None => {}
            Some(Value::Object(props)) => node.properties = Properties(props.clone()),
            Some(_) => return Err(ConfigError::malformed(at, "`properties` must be an object")),
        }

        match obj.get("slots") {
            None => {}
            Some(Value::Object(slots)) => {
                for (name, value) in slots {
                    let slot_at = format!("{at}.slots.{name}");
                    let slot = match value {
                        Value::Array(items) => SlotNode::Many(
                            items
                                .iter()
                                .enumerate()
                                .map(|(i, item)| self.node(item, &format!("{slot_at}[{i}]")))
                                .collect::<ConfigResult<_>>()?,
                        ),
                        other => SlotNode::One(Box::new(self.node(other, &slot_at)?)),
                    };
                    node.slots.insert(name.clone(), slot);
                }
            }
            Some(_) => return Err(ConfigError::malformed(at, "`slots` must be an object")),
        }

        match obj.get("references") {
            None => {}
            Some(Value::Object(refs)) => {
                for (name, target) in refs {
                    let target = target.as_str().ok_or_else(|| {
                        ConfigError::malformed(
                            format!("{at}.references.{name}"),
                            "reference target must be a module id",
                        )
                    })?;
                    node.references.insert(name.clone(), target.to_string());
                }
            }
            Some(_) => return Err(ConfigError::malformed(at, "`references` must be an object")),
        }

        Ok(node)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // ── Parsing ──────────────────────────────────────────────────────

    #[test]
    fn parse_minimal() {
        let d = Descriptor::from_json(r#"{"version": 2, "root": {"type": "Window.Simple"}}"#).unwrap();
        assert_eq!(d.root.type_name, "Window.Simple");
        assert!(d.root.slots.is_empty());
    }

    #[test]
    fn parse_full_node() {
        let d = Descriptor::from_value(&json!({
            "version": 2,
            "root": {
                "type": "Layout.Box",
                "id": "box",
                "properties": { "spacing": 4 },
                "slots": {
                    "content": [ { "type": "Card.Default" }, { "type": "Card.Default" } ]
                },
                "references": { "peer": "other" }
            }
        }))
        .unwrap();

        let root = d.root;
        assert_eq!(root.id.as_deref(), Some("box"));
        assert_eq!(root.properties.get("spacing"), Some(&json!(4)));
        assert!(root.slots["content"].is_many());
        assert_eq!(root.slots["content"].nodes().len(), 2);
        assert_eq!(root.references["peer"], "other");
    }

    #[test]
    fn named_modules_expand_inline() {
        let d = Descriptor::from_value(&json!({
            "version": 2,
            "root": { "type": "Window.Simple", "slots": { "content": "group" } },
            "modules": { "group": { "type": "Layout.Box" } }
        }))
        .unwrap();
        let content = d.root.slots["content"].nodes()[0];
        assert_eq!(content.type_name, "Layout.Box");
    }

    #[test]
    fn root_may_be_named() {
        let d = Descriptor::from_value(&json!({
            "version": 2,
            "root": "main",
            "modules": { "main": { "type": "Window.Simple" } }
        }))
        .unwrap();
        assert_eq!(d.root.type_name, "Window.Simple");
    }

    // ── Fail-fast validation ─────────────────────────────────────────

    #[test]
    fn wrong_version() {
        let err = Descriptor::from_json(r#"{"version": 1, "root": {"type": "X"}}"#).unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedVersion { found: 1, expected: 2 });
    }

    #[test]
    fn missing_type() {
        let err = Descriptor::from_json(r#"{"version": 2, "root": {"id": "x"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDescriptor { ref at, .. } if at == "root"));
    }

    #[test]
    fn unknown_node_key() {
        let err = Descriptor::from_json(r#"{"version": 2, "root": {"type": "X", "slot": {}}}"#).unwrap_err();
        assert!(err.to_string().contains("unexpected key `slot`"));
    }

    #[test]
    fn bad_slot_value_reports_path() {
        let err = Descriptor::from_value(&json!({
            "version": 2,
            "root": { "type": "Layout.Box", "slots": { "content": [ { "type": "A" }, 7 ] } }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDescriptor { ref at, .. } if at == "root.slots.content[1]"));
    }

    #[test]
    fn unknown_named_module() {
        let err = Descriptor::from_value(&json!({
            "version": 2,
            "root": { "type": "Window.Simple", "slots": { "content": "missing" } }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("no module named `missing`"));
    }

    #[test]
    fn self_including_module() {
        let err = Descriptor::from_value(&json!({
            "version": 2,
            "root": "a",
            "modules": { "a": { "type": "Window.Simple", "slots": { "content": "a" } } }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("includes itself"));
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(Descriptor::from_json("{"), Err(ConfigError::Json(_))));
    }

    // ── Builders ─────────────────────────────────────────────────────

    #[test]
    fn repeated_with_slot_becomes_list() {
        let node = ModuleNode::new("Layout.Box")
            .with_slot("content", ModuleNode::new("A"))
            .with_slot("content", ModuleNode::new("B"));
        assert!(node.slots["content"].is_many());
        assert_eq!(node.descendants().len(), 3);
    }

    #[test]
    fn to_value_parses_back() {
        let node = ModuleNode::new("Window.Simple")
            .with_id("win")
            .with_property("title", "Hello")
            .with_slot("content", ModuleNode::new("Layout.Box"))
            .with_reference("peer", "other");
        let back = ModuleNode::from_value(&node.to_value()).unwrap();
        assert_eq!(back, node);
    }

    // ── Properties ───────────────────────────────────────────────────

    #[test]
    fn typed_getters() {
        let props = Properties::new()
            .with("invert", true)
            .with("max_cards", 3)
            .with("tag", "cats")
            .with("ids", json!(["a", "b"]));
        assert!(props.get_bool("T", "invert", false).unwrap());
        assert!(!props.get_bool("T", "absent", false).unwrap());
        assert_eq!(props.get_usize("T", "max_cards", 0).unwrap(), 3);
        assert_eq!(props.get_str("T", "tag").unwrap().as_deref(), Some("cats"));
        assert_eq!(props.get_str_list("T", "ids").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn typed_getter_mismatch() {
        let props = Properties::new().with("invert", "yes");
        let err = props.get_bool("Filter.Featured", "invert", false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProperty { ref property, .. } if property == "invert"));
    }

    #[test]
    fn merge_other_wins() {
        let mut base = Properties::new().with("a", 1).with("b", 1);
        base.merge(&Properties::new().with("b", 2));
        assert_eq!(base.get("a"), Some(&json!(1)));
        assert_eq!(base.get("b"), Some(&json!(2)));
    }

    #[test]
    fn record_property() {
        let props = Properties::new().with("record", json!({"id": "a", "title": "A"}));
        let record = props.get_record("Card.Default", "record").unwrap().unwrap();
        assert_eq!(record.title, "A");
    }
}
