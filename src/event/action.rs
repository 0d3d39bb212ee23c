//! The closed, versioned action vocabulary carried by the dispatcher.
//!
//! Actions serialize as JSON objects with a mandatory `action_type`
//! discriminant plus action-specific fields:
//!
//! ```json
//! { "action_type": "search-text-entered", "text": "big cats" }
//! ```

use serde::{Deserialize, Serialize};

use crate::content::ContentRecord;
use crate::error::ConfigError;

/// Version of the action vocabulary below. Bumped whenever an action is
/// added, removed, or changes its fields.
pub const ACTION_VOCABULARY_VERSION: u32 = 1;

/// A typed action payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "kebab-case")]
pub enum Action {
    HomeClicked,
    AllSetsClicked,
    SetClicked {
        model: ContentRecord,
    },
    /// An item was activated; `context` holds its siblings in display order.
    ItemClicked {
        model: ContentRecord,
        #[serde(default)]
        context: Vec<ContentRecord>,
    },
    SearchTextEntered {
        text: String,
    },
    HistoryBackClicked,
    HistoryForwardClicked,
    NextDocumentClicked,
    PreviousDocumentClicked,
    /// New content became available in the engine.
    ContentAdded {
        #[serde(default)]
        ids: Vec<String>,
    },
    /// A filter's user-visible state changed (`filter` is its type name).
    FilterChanged {
        #[serde(default)]
        filter: String,
    },
}

impl Action {
    /// The `action_type` discriminant.
    pub fn action_type(&self) -> &'static str {
        match self {
            Action::HomeClicked => "home-clicked",
            Action::AllSetsClicked => "all-sets-clicked",
            Action::SetClicked { .. } => "set-clicked",
            Action::ItemClicked { .. } => "item-clicked",
            Action::SearchTextEntered { .. } => "search-text-entered",
            Action::HistoryBackClicked => "history-back-clicked",
            Action::HistoryForwardClicked => "history-forward-clicked",
            Action::NextDocumentClicked => "next-document-clicked",
            Action::PreviousDocumentClicked => "previous-document-clicked",
            Action::ContentAdded { .. } => "content-added",
            Action::FilterChanged { .. } => "filter-changed",
        }
    }

    /// Parse an action from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn item_clicked(model: ContentRecord, context: Vec<ContentRecord>) -> Self {
        Action::ItemClicked { model, context }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Action::SearchTextEntered { text: text.into() }
    }
}
