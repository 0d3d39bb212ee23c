//! Built-in selection sources.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::content::{ContentRecord, Query, ReadingHistory, ARTICLE_TAG, SET_TAG};
use crate::event::{Action, Emitter};
use crate::history::{HistoryStore, PageType};

use super::source::SelectionSource;

/// Replace the record in `slot` when its id differs. Returns whether it did.
fn swap_record(slot: &RefCell<Option<ContentRecord>>, next: Option<ContentRecord>) -> bool {
    let mut current = slot.borrow_mut();
    let same = current.as_ref().map(|r| &r.id) == next.as_ref().map(|r| &r.id);
    if !same {
        *current = next;
    }
    !same
}

fn articles() -> Query {
    Query::new().with_tags_match_all([ARTICLE_TAG])
}

// ---------------------------------------------------------------------------
// All
// ---------------------------------------------------------------------------

/// Every article.
#[derive(Debug, Default)]
pub struct AllContent;

impl SelectionSource for AllContent {
    fn type_name(&self) -> &'static str {
        "Selection.All"
    }

    fn query_count(&self) -> usize {
        1
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        (index == 0).then(articles)
    }
}

// ---------------------------------------------------------------------------
// Featured
// ---------------------------------------------------------------------------

/// Featured articles first, then the rest.
#[derive(Debug, Default)]
pub struct FeaturedFirst;

impl SelectionSource for FeaturedFirst {
    fn type_name(&self) -> &'static str {
        "Selection.Featured"
    }

    fn query_count(&self) -> usize {
        2
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        match index {
            0 => Some(articles().with_featured(Some(true))),
            1 => Some(articles().with_featured(Some(false))),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Articles matching the current search terms.
#[derive(Debug, Default)]
pub struct SearchResults {
    terms: RefCell<String>,
}

impl SearchResults {
    pub fn terms(&self) -> String {
        self.terms.borrow().clone()
    }
}

impl SelectionSource for SearchResults {
    fn type_name(&self) -> &'static str {
        "Selection.Search"
    }

    fn query_count(&self) -> usize {
        1
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        let terms = self.terms.borrow();
        if index != 0 || terms.is_empty() {
            return None;
        }
        Some(articles().with_terms(terms.as_str()))
    }

    fn sync_history(&self, history: &HistoryStore) -> bool {
        let next = history.current_query();
        let mut terms = self.terms.borrow_mut();
        if *terms == next {
            return false;
        }
        *terms = next;
        true
    }
}

// ---------------------------------------------------------------------------
// ContentForSet
// ---------------------------------------------------------------------------

/// Content tagged with any of the current set's child tags.
#[derive(Debug, Default)]
pub struct ContentForSet {
    set: RefCell<Option<ContentRecord>>,
}

impl ContentForSet {
    pub fn set(&self) -> Option<ContentRecord> {
        self.set.borrow().clone()
    }
}

impl SelectionSource for ContentForSet {
    fn type_name(&self) -> &'static str {
        "Selection.ContentForSet"
    }

    fn query_count(&self) -> usize {
        1
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        let set = self.set.borrow();
        let set = set.as_ref().filter(|s| index == 0 && !s.child_tags.is_empty())?;
        Some(Query::new().with_tags_match_any(set.child_tags.iter().map(String::as_str)))
    }

    fn sync_history(&self, history: &HistoryStore) -> bool {
        swap_record(&self.set, history.current_set())
    }

    /// Outside the set's own page, "more" opens that page.
    fn show_more(&self, history: &HistoryStore) -> Option<Action> {
        let set = self.set()?;
        let on_page = history
            .current_item()
            .is_some_and(|item| item.page_type == PageType::Set && item.model_id() == Some(set.id.as_str()));
        (!on_page).then_some(Action::SetClicked { model: set })
    }
}

// ---------------------------------------------------------------------------
// AllSets
// ---------------------------------------------------------------------------

/// Every set record.
#[derive(Debug, Default)]
pub struct AllSets;

impl SelectionSource for AllSets {
    fn type_name(&self) -> &'static str {
        "Selection.AllSets"
    }

    fn query_count(&self) -> usize {
        1
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        (index == 0).then(|| Query::new().with_tags_match_all([SET_TAG]))
    }

    fn show_more(&self, history: &HistoryStore) -> Option<Action> {
        let on_page = history
            .current_item()
            .is_some_and(|item| item.page_type == PageType::AllSets);
        (!on_page).then_some(Action::AllSetsClicked)
    }
}

// ---------------------------------------------------------------------------
// Supplementary
// ---------------------------------------------------------------------------

/// Articles outside the current set: unread ones first, then read ones.
///
/// The read ids are a snapshot taken at construction and refreshed only in
/// `sync_inputs`, so both queries stay stable while the selection pages.
pub struct Supplementary {
    reading: Rc<dyn ReadingHistory>,
    read: RefCell<BTreeSet<String>>,
    set: RefCell<Option<ContentRecord>>,
}

impl Supplementary {
    pub fn new(reading: Rc<dyn ReadingHistory>) -> Self {
        let read = reading.all_read_ids();
        Self {
            reading,
            read: RefCell::new(read),
            set: RefCell::new(None),
        }
    }

    fn outside_set(&self) -> Query {
        let set = self.set.borrow();
        let excluded = set.iter().flat_map(|s| s.child_tags.iter().map(String::as_str));
        articles().with_excluded_tags(excluded)
    }
}

impl SelectionSource for Supplementary {
    fn type_name(&self) -> &'static str {
        "Selection.Supplementary"
    }

    fn query_count(&self) -> usize {
        2
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        let read = self.read.borrow();
        match index {
            0 => Some(self.outside_set().with_excluded_ids(read.iter().map(String::as_str))),
            1 if !read.is_empty() => Some(self.outside_set().with_ids(read.iter().map(String::as_str))),
            _ => None,
        }
    }

    fn sync_history(&self, history: &HistoryStore) -> bool {
        swap_record(&self.set, history.current_set())
    }

    fn inputs_changed(&self) -> Option<&Emitter<()>> {
        Some(self.reading.changed())
    }

    fn sync_inputs(&self) -> bool {
        let next = self.reading.all_read_ids();
        let mut read = self.read.borrow_mut();
        let changed = *read != next;
        if changed {
            *read = next;
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Related
// ---------------------------------------------------------------------------

/// Articles sharing a public tag with the current item's record.
#[derive(Debug, Default)]
pub struct Related {
    model: RefCell<Option<ContentRecord>>,
}

impl SelectionSource for Related {
    fn type_name(&self) -> &'static str {
        "Selection.Related"
    }

    fn query_count(&self) -> usize {
        1
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        let model = self.model.borrow();
        let model = model.as_ref().filter(|_| index == 0)?;
        let tags: Vec<&str> = model.public_tags().collect();
        if tags.is_empty() {
            return None;
        }
        Some(
            articles()
                .with_tags_match_any(tags)
                .with_excluded_ids([model.id.as_str()]),
        )
    }

    fn sync_history(&self, history: &HistoryStore) -> bool {
        let model = history.current_item().and_then(|item| item.model);
        swap_record(&self.model, model)
    }
}

// ---------------------------------------------------------------------------
// Next / Previous
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Previous,
}

/// The neighbour of the current item within its context list.
#[derive(Debug)]
pub struct Sibling {
    step: Step,
    target: RefCell<Option<ContentRecord>>,
}

impl Sibling {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            target: RefCell::new(None),
        }
    }

    pub fn target(&self) -> Option<ContentRecord> {
        self.target.borrow().clone()
    }
}

impl SelectionSource for Sibling {
    fn type_name(&self) -> &'static str {
        match self.step {
            Step::Next => "Selection.Next",
            Step::Previous => "Selection.Previous",
        }
    }

    fn query_count(&self) -> usize {
        1
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        let target = self.target.borrow();
        let target = target.as_ref().filter(|_| index == 0)?;
        Some(Query::new().with_ids([target.id.as_str()]))
    }

    fn sync_history(&self, history: &HistoryStore) -> bool {
        let target = history.current_item().and_then(|item| {
            let position = item.context_position()?;
            let neighbour = match self.step {
                Step::Next => position.checked_add(1)?,
                Step::Previous => position.checked_sub(1)?,
            };
            item.context.get(neighbour).cloned()
        });
        swap_record(&self.target, target)
    }
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// A fixed list of ids.
#[derive(Debug, Default)]
pub struct StaticIds {
    ids: Vec<String>,
}

impl StaticIds {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }
}

impl SelectionSource for StaticIds {
    fn type_name(&self) -> &'static str {
        "Selection.Static"
    }

    fn query_count(&self) -> usize {
        1
    }

    fn build_query(&self, index: usize) -> Option<Query> {
        if index != 0 || self.ids.is_empty() {
            return None;
        }
        Some(Query::new().with_ids(self.ids.iter().map(String::as_str)))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
