//! ContentRecord: one immutable item of content.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix marking system tags that are not meant for display.
pub const RESERVED_TAG_PREFIX: &str = "Ekn";

/// Reserved tag carried by "set" (category) records.
pub const SET_TAG: &str = "EknSetObject";

/// Reserved tag carried by article records.
pub const ARTICLE_TAG: &str = "EknArticleObject";

/// One item of content: an article, an image, a set, and so on.
///
/// Records are values. The identifier is stable across queries and globally
/// unique; tags are case-sensitive exact strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sequence_number: Option<u64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// For set records: the tags whose content belongs to this set.
    #[serde(default)]
    pub child_tags: BTreeSet<String>,
}

impl ContentRecord {
    /// Create a record with the given id and empty attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            synopsis: String::new(),
            tags: BTreeSet::new(),
            featured: false,
            published: None,
            sequence_number: None,
            thumbnail: None,
            child_tags: BTreeSet::new(),
        }
    }

    /// An article record (carries [`ARTICLE_TAG`]).
    pub fn article(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id).with_title(title).with_tag(ARTICLE_TAG)
    }

    /// A set record (carries [`SET_TAG`]) grouping content tagged `child_tag`.
    pub fn set(id: impl Into<String>, title: impl Into<String>, child_tag: impl Into<String>) -> Self {
        Self::new(id)
            .with_title(title)
            .with_tag(SET_TAG)
            .with_child_tag(child_tag)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = synopsis.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_child_tag(mut self, tag: impl Into<String>) -> Self {
        self.child_tags.insert(tag.into());
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    pub fn with_sequence(mut self, n: u64) -> Self {
        self.sequence_number = Some(n);
        self
    }

    pub fn with_thumbnail(mut self, uri: impl Into<String>) -> Self {
        self.thumbnail = Some(uri.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether this record is a set (category) rather than a piece of content.
    pub fn is_set(&self) -> bool {
        self.has_tag(SET_TAG)
    }

    /// Tags without the reserved system prefix.
    pub fn public_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|t| !t.starts_with(RESERVED_TAG_PREFIX))
    }
}
