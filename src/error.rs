//! Error taxonomy.
//!
//! Three classes of failure exist in a composed application:
//!
//! - [`ConfigError`]: the descriptor cannot be turned into a module graph.
//!   Raised synchronously from descriptor parsing and factory construction,
//!   always naming the offending type, slot or reference.
//! - [`QueryError`](crate::content::QueryError): the content engine failed a
//!   query. Captured into selection state, never thrown across the loader.
//! - [`HandlerError`]: a dispatcher subscriber failed. Logged and isolated.
//!
//! [`ComposeError`] wraps the first class together with the I/O and TOML
//! failures that can happen while loading an application from disk.

use thiserror::Error;

pub use crate::content::engine::{QueryError, QueryErrorReason};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A descriptor or module configuration problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No class is registered for the type name, neither as an explicit
    /// override nor under its conventional namespace path.
    #[error("no module named `{type_name}` (looked up as `{path}`)")]
    ModuleNotFound { type_name: String, path: String },

    /// A required single-valued slot has no descriptor entry.
    #[error("module `{module_type}` requires slot `{slot}`")]
    MissingSlot { module_type: String, slot: String },

    /// The descriptor fills a slot the module type does not declare.
    #[error("module `{module_type}` has no slot named `{slot}`")]
    UnknownSlot { module_type: String, slot: String },

    /// A slot value has the wrong shape (array for a single slot, etc).
    #[error("slot `{slot}` of `{module_type}` is malformed: {reason}")]
    MalformedSlot {
        module_type: String,
        slot: String,
        reason: String,
    },

    /// The descriptor names a reference the module type does not declare.
    #[error("module `{module_type}` has no reference named `{reference}`")]
    UnknownReference {
        module_type: String,
        reference: String,
    },

    /// A required reference is absent from the descriptor.
    #[error("module `{module_type}` requires reference `{reference}`")]
    MissingReference {
        module_type: String,
        reference: String,
    },

    /// A reference points at an id that is unknown or not yet constructed.
    #[error("reference `{reference}` of `{module_type}` points at `{target}`, which is not built yet")]
    UnresolvedReference {
        module_type: String,
        reference: String,
        target: String,
    },

    /// A referenced module does not have the capability the referrer needs.
    #[error("reference `{reference}` of `{module_type}` expects a {expected}")]
    ReferenceMismatch {
        module_type: String,
        reference: String,
        expected: String,
    },

    #[error("module id `{id}` is defined more than once")]
    DuplicateId { id: String },

    /// Ids are meaningless inside or below multi-valued or template slots,
    /// which may produce many instances of the same node.
    #[error("module id `{id}` is defined inside a multi-valued slot")]
    IdInMultiSlot { id: String },

    #[error("property `{property}` of `{module_type}` is invalid: {reason}")]
    InvalidProperty {
        module_type: String,
        property: String,
        reason: String,
    },

    #[error("descriptor version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u64 },

    /// Structural problem in the descriptor document itself.
    #[error("malformed descriptor at `{at}`: {reason}")]
    MalformedDescriptor { at: String, reason: String },

    #[error("descriptor is not valid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

impl ConfigError {
    pub(crate) fn malformed(at: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::MalformedDescriptor {
            at: at.into(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// HandlerError
// ---------------------------------------------------------------------------

/// Failure reported by a dispatcher subscriber.
///
/// The dispatcher logs it and keeps delivering to the remaining subscribers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{handler}: {message}")]
pub struct HandlerError {
    pub handler: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ComposeError
// ---------------------------------------------------------------------------

/// Top-level error for loading configuration and applications.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias for descriptor and factory operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for application-level operations.
pub type Result<T> = std::result::Result<T, ComposeError>;

// ===========================================================================
// Tests
// ===========================================================================
