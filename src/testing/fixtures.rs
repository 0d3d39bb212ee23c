//! Record and descriptor fixtures.

use chrono::{TimeZone, Utc};

use crate::content::ContentRecord;
use crate::module::{Descriptor, ModuleNode};

/// Tags of the two fixture sets, and the sets' ids.
pub const ANIMALS: &str = "animals";
pub const PLANTS: &str = "plants";
pub const ANIMALS_SET: &str = "set-animals";
pub const PLANTS_SET: &str = "set-plants";

/// Article `i`: id `a{i:02}`, title `Article {i:02}`, sequence `i`, published
/// `i` days after 2024-01-01. Even articles are animals, odd ones plants;
/// every third is featured.
pub fn article(i: usize) -> ContentRecord {
    let topic = if i % 2 == 0 { ANIMALS } else { PLANTS };
    let record = ContentRecord::article(format!("a{i:02}"), format!("Article {i:02}"))
        .with_tag(topic)
        .with_sequence(i as u64)
        .featured(i % 3 == 0);
    match Utc.timestamp_opt(1_704_067_200 + i as i64 * 86_400, 0).single() {
        Some(published) => record.with_published(published),
        None => record,
    }
}

/// `count` articles, `a00` onwards.
pub fn articles(count: usize) -> Vec<ContentRecord> {
    (0..count).map(article).collect()
}

pub fn sets() -> Vec<ContentRecord> {
    vec![
        ContentRecord::set(ANIMALS_SET, "Animals", ANIMALS),
        ContentRecord::set(PLANTS_SET, "Plants", PLANTS),
    ]
}

/// Both sets plus `count` articles.
pub fn library(count: usize) -> Vec<ContentRecord> {
    let mut records = sets();
    records.extend(articles(count));
    records
}

/// A content group showing `selection` through a list of default cards.
pub fn group(id: &str, selection: ModuleNode, page_size: usize) -> ModuleNode {
    ModuleNode::new("ContentGroup.ContentGroup")
        .with_id(id)
        .with_property("page_size", page_size)
        .with_slot("selection", selection)
        .with_slot(
            "arrangement",
            ModuleNode::new("Arrangement.List").with_slot("card", ModuleNode::new("Card.Default")),
        )
}

/// A mesh-navigated home page. Ids live only under single slots:
///
/// * `search` group with selection `search-sel` in the outer sidebar,
/// * `featured` group with selection `featured-sel` in the inner sidebar,
/// * `sets` group with selection `sets-sel` as the main content.
pub fn home_page(page_size: usize) -> Descriptor {
    let main = ModuleNode::new("Layout.Sidebar")
        .with_slot(
            "sidebar",
            group("featured", ModuleNode::new("Selection.Featured").with_id("featured-sel"), page_size),
        )
        .with_slot(
            "content",
            group("sets", ModuleNode::new("Selection.AllSets").with_id("sets-sel"), page_size),
        );
    let outer = ModuleNode::new("Layout.Sidebar")
        .with_slot(
            "sidebar",
            group("search", ModuleNode::new("Selection.Search").with_id("search-sel"), page_size),
        )
        .with_slot("content", main);
    Descriptor::new(
        ModuleNode::new("Controller.Mesh")
            .with_slot("window", ModuleNode::new("Window.Simple").with_slot("content", outer)),
    )
}
