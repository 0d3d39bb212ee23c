//! HistoryItem: a snapshot of one navigation state.

use serde::{Deserialize, Serialize};

use crate::content::ContentRecord;

/// Kind of page a history item shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    #[default]
    Home,
    Set,
    Search,
    Article,
    AllSets,
}

/// How the current item was reached from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Forward,
    Back,
    Replace,
}

/// One navigation state.
///
/// Items are values: the store pushes new items instead of mutating old ones.
/// Only `direction` is rewritten, by the store, as the item moves through the
/// back and forward stacks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryItem {
    pub page_type: PageType,
    /// The focused record: the article on an article page, the set on a set page.
    #[serde(default)]
    pub model: Option<ContentRecord>,
    /// Search terms that led here. Empty when none.
    #[serde(default)]
    pub query: String,
    /// The set this item was reached through, if any.
    #[serde(default)]
    pub set: Option<ContentRecord>,
    /// Sibling records, in display order, for next/previous navigation.
    #[serde(default)]
    pub context: Vec<ContentRecord>,
    #[serde(default)]
    pub direction: Direction,
}

impl HistoryItem {
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            ..Self::default()
        }
    }

    pub fn home() -> Self {
        Self::new(PageType::Home)
    }

    pub fn article(model: ContentRecord) -> Self {
        Self::new(PageType::Article).with_model(model)
    }

    pub fn set_page(set: ContentRecord) -> Self {
        Self::new(PageType::Set).with_model(set)
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self::new(PageType::Search).with_query(query)
    }

    pub fn with_model(mut self, model: ContentRecord) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_set(mut self, set: ContentRecord) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_context(mut self, context: Vec<ContentRecord>) -> Self {
        self.context = context;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.id.as_str())
    }

    pub fn set_id(&self) -> Option<&str> {
        self.set.as_ref().map(|s| s.id.as_str())
    }

    /// Navigation equality: same page type, model, query, and set.
    ///
    /// Context and direction are ignored, so re-clicking the current item
    /// from a different list is not a new navigation.
    pub fn equals(&self, other: &HistoryItem) -> bool {
        self.page_type == other.page_type
            && self.model_id() == other.model_id()
            && self.query == other.query
            && self.set_id() == other.set_id()
    }

    /// Index of the model within `context`.
    pub fn context_position(&self) -> Option<usize> {
        let id = self.model_id()?;
        self.context.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_ignores_context_and_direction() {
        let a = ContentRecord::article("a", "A");
        let left = HistoryItem::article(a.clone()).with_context(vec![a.clone()]);
        let right = HistoryItem::article(a).with_direction(Direction::Back);
        assert!(left.equals(&right));
    }

    #[test]
    fn equals_compares_page_and_query() {
        assert!(!HistoryItem::home().equals(&HistoryItem::search("x")));
        assert!(!HistoryItem::search("x").equals(&HistoryItem::search("y")));
        assert!(HistoryItem::search("x").equals(&HistoryItem::search("x")));
    }

    #[test]
    fn context_position_finds_model() {
        let records = vec![
            ContentRecord::article("a", "A"),
            ContentRecord::article("b", "B"),
        ];
        let item = HistoryItem::article(records[1].clone()).with_context(records);
        assert_eq!(item.context_position(), Some(1));
        assert_eq!(HistoryItem::home().context_position(), None);
    }

    #[test]
    fn page_type_serializes_kebab_case() {
        let json = serde_json::to_string(&PageType::AllSets).unwrap();
        assert_eq!(json, "\"all-sets\"");
    }
}
