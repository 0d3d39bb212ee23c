//! ComposeConfig: tuning knobs for a composed application.
//!
//! Built in code with `with_*` builders, or loaded from TOML:
//!
//! ```toml
//! page_size = 20
//! history_depth = 100
//! filter_overfetch = 4
//! log_filter = "gilt_compose=debug"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, ConfigError};
use crate::history::DEFAULT_HISTORY_DEPTH;

/// Configuration for an [`App`](crate::app::App).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Records requested per `load_more`.
    pub page_size: usize,
    /// Bound on the history back stack.
    pub history_depth: usize,
    /// Multiplier applied to a fetch's limit when a selection has filters,
    /// so that enough records survive filtering.
    pub filter_overfetch: usize,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            history_depth: DEFAULT_HISTORY_DEPTH,
            filter_overfetch: 3,
            log_filter: None,
        }
    }
}

impl ComposeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_filter_overfetch(mut self, factor: usize) -> Self {
        self.filter_overfetch = factor;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ComposeError> {
        let config: ComposeConfig = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ComposeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the selection machinery cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("page_size", self.page_size),
            ("filter_overfetch", self.filter_overfetch),
        ];
        for (property, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidProperty {
                    module_type: "ComposeConfig".into(),
                    property: property.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = ComposeConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.history_depth, 50);
        assert_eq!(config.filter_overfetch, 3);
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn builder_chain() {
        let config = ComposeConfig::new()
            .with_page_size(5)
            .with_history_depth(3)
            .with_filter_overfetch(2)
            .with_log_filter("debug");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.history_depth, 3);
        assert_eq!(config.filter_overfetch, 2);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn toml_partial_uses_defaults() {
        let config = ComposeConfig::from_toml_str("page_size = 25\n").unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.history_depth, 50);
    }

    #[test]
    fn toml_zero_page_size_rejected() {
        let err = ComposeConfig::from_toml_str("page_size = 0").unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Config(ConfigError::InvalidProperty { ref property, .. }) if property == "page_size"
        ));
    }

    #[test]
    fn toml_syntax_error() {
        let err = ComposeConfig::from_toml_str("page_size = ").unwrap_err();
        assert!(matches!(err, ComposeError::Toml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ComposeConfig::from_file("/nonexistent/compose.toml").unwrap_err();
        assert!(matches!(err, ComposeError::Io(_)));
    }
}
