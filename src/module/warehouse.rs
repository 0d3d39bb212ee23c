//! Warehouse: type name to module class registry.
//!
//! Lookup order:
//!
//! 1. explicit overrides added with [`Warehouse::register`];
//! 2. the namespace table, keyed by the path derived from the type name.
//!
//! The namespace table is populated at startup: every built-in module file
//! family exports a `CLASSES` table and [`Warehouse::with_builtins`] installs them
//! all. A type name's derived path lower-cases its first dotted segment to
//! form the namespace and keeps the rest as the symbol, so
//! `"Filter.Featured"` lives at `filter::Featured`.

use std::collections::BTreeMap;

use tracing::debug;

use super::class::ModuleClass;
use crate::error::{ConfigError, ConfigResult};

/// Namespace and symbol derived from a type name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModulePath {
    pub namespace: String,
    pub symbol: String,
}

impl ModulePath {
    pub fn derive(type_name: &str) -> Self {
        match type_name.split_once('.') {
            Some((namespace, symbol)) => Self {
                namespace: namespace.to_lowercase(),
                symbol: symbol.to_string(),
            },
            None => Self {
                namespace: String::new(),
                symbol: type_name.to_string(),
            },
        }
    }
}

impl std::fmt::Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.symbol)
        } else {
            write!(f, "{}::{}", self.namespace, self.symbol)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Warehouse {
    overrides: BTreeMap<String, ModuleClass>,
    namespaces: BTreeMap<String, BTreeMap<String, ModuleClass>>,
}

impl Warehouse {
    /// An empty warehouse.
    pub fn new() -> Self {
        Self::default()
    }

    /// A warehouse holding every built-in module type.
    pub fn with_builtins() -> Self {
        let mut warehouse = Self::new();
        let builtins = crate::filter::CLASSES
            .iter()
            .chain(crate::order::CLASSES)
            .chain(crate::selection::CLASSES)
            .chain(crate::components::CLASSES);
        for class in builtins {
            warehouse.install(*class);
        }
        warehouse
    }

    /// Add `class` to the namespace table under its derived path.
    pub fn install(&mut self, class: ModuleClass) {
        let path = ModulePath::derive(class.type_name);
        self.namespaces
            .entry(path.namespace)
            .or_default()
            .insert(path.symbol, class);
    }

    /// Register an explicit override for `type_name`. Overrides win over the
    /// namespace table.
    pub fn register(&mut self, type_name: impl Into<String>, class: ModuleClass) {
        let type_name = type_name.into();
        debug!(type_name = %type_name, class = class.type_name, "registering module override");
        self.overrides.insert(type_name, class);
    }

    pub fn resolve(&self, type_name: &str) -> ConfigResult<ModuleClass> {
        if let Some(class) = self.overrides.get(type_name) {
            return Ok(*class);
        }
        let path = ModulePath::derive(type_name);
        self.namespaces
            .get(&path.namespace)
            .and_then(|ns| ns.get(&path.symbol))
            .copied()
            .ok_or_else(|| ConfigError::ModuleNotFound {
                type_name: type_name.to_string(),
                path: path.to_string(),
            })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.resolve(type_name).is_ok()
    }

    /// Every type name reachable through the namespace table, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .namespaces
            .values()
            .flat_map(|ns| ns.values().map(|c| c.type_name))
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::class::Capability;

    // ── Path derivation ──────────────────────────────────────────────

    #[test]
    fn derive_lowercases_first_segment() {
        let path = ModulePath::derive("Filter.Featured");
        assert_eq!(path.namespace, "filter");
        assert_eq!(path.symbol, "Featured");
        assert_eq!(path.to_string(), "filter::Featured");
    }

    #[test]
    fn derive_keeps_dotted_tail() {
        let path = ModulePath::derive("ContentGroup.Grid.Wide");
        assert_eq!(path.namespace, "contentgroup");
        assert_eq!(path.symbol, "Grid.Wide");
    }

    #[test]
    fn derive_single_segment() {
        let path = ModulePath::derive("Standalone");
        assert_eq!(path.namespace, "");
        assert_eq!(path.to_string(), "Standalone");
    }

    // ── Resolution ───────────────────────────────────────────────────

    #[test]
    fn builtins_resolve() {
        let warehouse = Warehouse::with_builtins();
        let class = warehouse.resolve("Filter.Featured").unwrap();
        assert_eq!(class.type_name, "Filter.Featured");
        assert_eq!(class.capability, Capability::Filter);
        assert!(warehouse.contains("Selection.All"));
        assert!(warehouse.contains("Arrangement.List"));
    }

    #[test]
    fn namespace_lookup_is_case_insensitive_on_first_segment() {
        let warehouse = Warehouse::with_builtins();
        assert!(warehouse.contains("filter.Featured"));
        assert!(!warehouse.contains("Filter.featured"));
    }

    #[test]
    fn unknown_type_reports_path() {
        let err = Warehouse::with_builtins().resolve("Filter.Nope").unwrap_err();
        assert_eq!(
            err,
            ConfigError::ModuleNotFound {
                type_name: "Filter.Nope".into(),
                path: "filter::Nope".into(),
            }
        );
    }

    #[test]
    fn override_wins() {
        let mut warehouse = Warehouse::with_builtins();
        let unread = warehouse.resolve("Filter.Unread").unwrap();
        warehouse.register("Filter.Featured", unread);
        assert_eq!(warehouse.resolve("Filter.Featured").unwrap().type_name, "Filter.Unread");
    }

    #[test]
    fn override_may_introduce_new_names() {
        let mut warehouse = Warehouse::new();
        assert!(!warehouse.contains("Custom.Thing"));
        let class = Warehouse::with_builtins().resolve("Order.Alphabetical").unwrap();
        warehouse.register("Custom.Thing", class);
        assert!(warehouse.contains("Custom.Thing"));
    }

    #[test]
    fn type_names_sorted() {
        let names = Warehouse::with_builtins().type_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"Selection.Featured"));
    }
}
