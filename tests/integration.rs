//! Integration tests for gilt-compose.
//!
//! These tests exercise the public API from outside the crate: descriptors
//! are built into apps, driven through the headless harness, and checked
//! against the engine's observable behaviour.

use std::cell::Cell;
use std::rc::Rc;

use gilt_compose::app::App;
use gilt_compose::config::ComposeConfig;
use gilt_compose::content::{
    ContentRecord, MemoryEngine, MemoryReadingHistory, Query, QueryError, QueryResults, ReadingHistory,
};
use gilt_compose::error::{ComposeError, ConfigError, HandlerError};
use gilt_compose::event::{Action, Dispatcher};
use gilt_compose::filter::{Filter, Unread};
use gilt_compose::history::{Direction, HistoryItem, HistoryStore, PageType};
use gilt_compose::module::{Collaborators, Descriptor, ModuleNode};
use gilt_compose::selection::SelectionState;
use gilt_compose::testing::{fixtures, local, Harness};
use pretty_assertions::assert_eq;

fn single_group(selection: ModuleNode, page_size: usize) -> Descriptor {
    Descriptor::new(fixtures::group("group", selection.with_id("sel"), page_size))
}

// ---------------------------------------------------------------------------
// Descriptor loading
// ---------------------------------------------------------------------------

const HOME_JSON: &str = r#"{
    "version": 2,
    "root": {
        "type": "Controller.Mesh",
        "slots": { "window": "main-window" }
    },
    "modules": {
        "main-window": {
            "type": "Window.Simple",
            "properties": { "title": "Library" },
            "slots": { "content": "home" }
        },
        "home": {
            "type": "ContentGroup.ContentGroup",
            "id": "group",
            "properties": { "page_size": 3 },
            "slots": {
                "selection": {
                    "type": "Selection.All",
                    "id": "sel",
                    "slots": { "filter": [{ "type": "Filter.Unread" }] }
                },
                "arrangement": {
                    "type": "Arrangement.List",
                    "slots": { "card": { "type": "Card.Default" } }
                }
            }
        }
    }
}"#;

#[test]
fn test_json_descriptor_builds_app() {
    let engine = Rc::new(MemoryEngine::with_records(fixtures::library(6)));
    let app = App::from_json(HOME_JSON, Collaborators::new(engine), ComposeConfig::default()).unwrap();
    assert!(app.selection("sel").is_some());
    assert_eq!(app.module("group").unwrap().type_name, "ContentGroup.ContentGroup");
    assert_eq!(app.history().current_item().unwrap().page_type, PageType::Home);
}

#[test]
fn test_factory_determinism_across_apps() {
    let engine = Rc::new(MemoryEngine::with_records(fixtures::library(6)));
    let first = App::new(
        &fixtures::home_page(4),
        Collaborators::new(engine.clone()),
        ComposeConfig::default(),
    )
    .unwrap();
    let second = App::new(&fixtures::home_page(4), Collaborators::new(engine), ComposeConfig::default())
        .unwrap();
    assert_eq!(first.tree().shape(), second.tree().shape());
    assert_eq!(first.tree().outline(), second.tree().outline());
}

#[test]
fn test_unknown_type_fails_fast() {
    let json = r#"{ "version": 2, "root": { "type": "Selection.Everything" } }"#;
    let engine = Rc::new(MemoryEngine::new());
    let err = App::from_json(json, Collaborators::new(engine), ComposeConfig::default()).unwrap_err();
    match err {
        ComposeError::Config(ConfigError::ModuleNotFound { type_name, path }) => {
            assert_eq!(type_name, "Selection.Everything");
            assert_eq!(path, "selection::Everything");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unresolved_reference_fails_fast() {
    let descriptor = Descriptor::new(
        ModuleNode::new("Selection.All")
            .with_slot("filter", ModuleNode::new("Filter.OtherGroup").with_reference("other", "missing")),
    );
    let err = Harness::new(&descriptor, Vec::new()).err().unwrap();
    assert!(matches!(
        err,
        ComposeError::Config(ConfigError::UnresolvedReference { .. })
    ));
}

#[test]
fn test_wrong_version_rejected() {
    let json = r#"{ "version": 1, "root": { "type": "Selection.All" } }"#;
    let engine = Rc::new(MemoryEngine::new());
    let err = App::from_json(json, Collaborators::new(engine), ComposeConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ComposeError::Config(ConfigError::UnsupportedVersion { found: 1, .. })
    ));
}

// ---------------------------------------------------------------------------
// Loading and pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_home_page_loads_and_renders() {
    local(async {
        let mut h = Harness::new(&fixtures::home_page(4), fixtures::library(10)).unwrap();
        h.start();
        h.settle().await;

        assert_eq!(h.model_ids("featured-sel"), vec!["a00", "a03", "a06", "a09"]);
        assert_eq!(
            h.model_ids("sets-sel"),
            vec![fixtures::ANIMALS_SET, fixtures::PLANTS_SET]
        );
        assert!(h.model_ids("search-sel").is_empty());
        // One card per shown record, each rendered once.
        assert_eq!(h.renderer().count(), 6);
    })
    .await;
}

#[tokio::test]
async fn test_show_more_appends_next_page() {
    local(async {
        let mut h = Harness::new(&fixtures::home_page(4), fixtures::library(10)).unwrap();
        h.start();
        h.settle().await;

        assert!(h.show_more("featured"));
        h.settle().await;
        // Featured records exhausted; the second query fills from the rest.
        assert_eq!(
            h.model_ids("featured-sel"),
            vec!["a00", "a03", "a06", "a09", "a01", "a02", "a04", "a05"]
        );
        assert_eq!(h.card_ids("featured").len(), 8);
    })
    .await;
}

#[tokio::test]
async fn test_show_more_on_sets_navigates() {
    local(async {
        let mut h = Harness::new(&fixtures::home_page(4), fixtures::library(10)).unwrap();
        h.start();
        h.settle().await;

        assert!(!h.show_more("sets"));
        assert_eq!(h.history().current_item().unwrap().page_type, PageType::AllSets);
    })
    .await;
}

#[tokio::test]
async fn test_exhaustion() {
    local(async {
        let mut h = Harness::new(&single_group(ModuleNode::new("Selection.All"), 4), fixtures::library(6)).unwrap();
        h.start();
        h.settle().await;
        let sel = h.selection("sel").unwrap();
        assert!(!sel.is_exhausted());

        h.show_more("group");
        h.settle().await;
        assert_eq!(sel.len(), 6);
        assert!(sel.is_exhausted());
        assert!(!h.show_more("group"));
    })
    .await;
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_search_refreshes_search_selection() {
    local(async {
        let mut h = Harness::new(&fixtures::home_page(4), fixtures::library(10)).unwrap();
        h.start();
        h.settle().await;

        h.search("article 0 AND (");
        h.settle().await;
        let item = h.history().current_item().unwrap();
        assert_eq!(item.page_type, PageType::Search);
        assert_eq!(item.query, "article 0");
        assert_eq!(h.model_ids("search-sel"), vec!["a00", "a01", "a02", "a03"]);

        h.back();
        assert_eq!(h.history().current_query(), "");
    })
    .await;
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_coalescing_issues_one_follow_up_fetch() {
    local(async {
        let mut h = Harness::new(&single_group(ModuleNode::new("Selection.All"), 2), fixtures::library(8)).unwrap();
        let gate = h.engine().hold();
        h.start();
        tokio::task::yield_now().await;

        let sel = h.selection("sel").unwrap();
        assert!(sel.is_loading());
        assert!(!h.show_more("group"));
        assert!(!h.show_more("group"));

        gate.respond(QueryResults::new(
            vec![fixtures::article(0), fixtures::article(1)],
            true,
        ));
        h.settle().await;

        assert_eq!(h.engine().queries().len(), 2);
        assert_eq!(sel.model_ids(), vec!["a00", "a01", "a02", "a03"]);
        assert_eq!(sel.state(), SelectionState::Ready);
    })
    .await;
}

#[tokio::test]
async fn test_stale_completion_is_dropped() {
    local(async {
        let mut h = Harness::new(&single_group(ModuleNode::new("Selection.All"), 2), fixtures::library(4)).unwrap();
        let gate = h.engine().hold();
        h.start();
        tokio::task::yield_now().await;

        // Superseded by a refresh before the held fetch answers.
        h.dispatch(Action::ContentAdded { ids: Vec::new() });
        gate.respond(QueryResults::last(vec![ContentRecord::article("stale", "Stale")]));
        h.settle().await;

        let ids = h.model_ids("sel");
        assert_eq!(ids, vec!["a00", "a01"]);
    })
    .await;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_query_failure_then_recovery() {
    local(async {
        let mut h = Harness::new(&single_group(ModuleNode::new("Selection.All"), 3), fixtures::library(6)).unwrap();
        h.engine().fail(QueryError::unavailable("offline"));
        h.start();
        h.settle().await;

        let sel = h.selection("sel").unwrap();
        assert_eq!(sel.state(), SelectionState::Error);
        assert_eq!(sel.error().unwrap().message, "offline");
        assert!(sel.is_empty());

        assert!(h.show_more("group"));
        h.settle().await;
        assert_eq!(sel.state(), SelectionState::Ready);
        assert_eq!(sel.len(), 3);
    })
    .await;
}

#[tokio::test]
async fn test_partial_failure_keeps_successful_index() {
    local(async {
        let mut h = Harness::new(&single_group(ModuleNode::new("Selection.Featured"), 4), fixtures::library(6)).unwrap();
        h.engine().respond(QueryResults::last(vec![fixtures::article(0)]));
        h.engine().fail(QueryError::unavailable("index 1 down"));
        h.start();
        h.settle().await;

        let sel = h.selection("sel").unwrap();
        assert_eq!(sel.state(), SelectionState::Ready);
        assert_eq!(sel.model_ids(), vec!["a00"]);
        assert!(!sel.is_exhausted());
    })
    .await;
}

// ---------------------------------------------------------------------------
// Filters reacting to external state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reading_an_item_refreshes_unread_selection() {
    local(async {
        let selection = ModuleNode::new("Selection.All").with_slot("filter", ModuleNode::new("Filter.Unread"));
        let descriptor = Descriptor::new(
            ModuleNode::new("Controller.Mesh").with_slot(
                "window",
                ModuleNode::new("Window.Simple")
                    .with_slot("content", fixtures::group("group", selection.with_id("sel"), 3)),
            ),
        );
        let mut h = Harness::new(&descriptor, fixtures::library(6)).unwrap();
        h.start();
        h.settle().await;
        assert_eq!(h.model_ids("sel"), vec!["a00", "a01", "a02"]);

        assert!(h.click_card("group", "a01"));
        h.settle().await;
        assert!(h.reading().is_read("a01"));
        assert_eq!(h.model_ids("sel"), vec!["a00", "a02", "a03"]);
    })
    .await;
}

#[tokio::test]
async fn test_other_group_excludes_sibling_records() {
    local(async {
        let first = fixtures::group("first", ModuleNode::new("Selection.All").with_id("first-sel"), 3);
        let second_sel = ModuleNode::new("Selection.All")
            .with_id("second-sel")
            .with_slot(
                "filter",
                ModuleNode::new("Filter.OtherGroup").with_reference("other", "first-sel"),
            );
        let second = fixtures::group("second", second_sel, 3);
        let descriptor = Descriptor::new(
            ModuleNode::new("Layout.Sidebar")
                .with_slot("sidebar", first)
                .with_slot("content", second),
        );
        let mut h = Harness::new(&descriptor, fixtures::library(8)).unwrap();
        h.start();
        h.settle().await;

        assert_eq!(h.model_ids("first-sel"), vec!["a00", "a01", "a02"]);
        assert_eq!(h.model_ids("second-sel"), vec!["a03", "a04", "a05"]);
    })
    .await;
}

// ---------------------------------------------------------------------------
// Sequential navigation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sequential_next_document() {
    local(async {
        let window = ModuleNode::new("Window.Simple").with_slot(
            "content",
            ModuleNode::new("Layout.Sidebar")
                .with_slot(
                    "sidebar",
                    fixtures::group("previous", ModuleNode::new("Selection.Previous").with_id("prev-sel"), 1),
                )
                .with_slot(
                    "content",
                    fixtures::group("next", ModuleNode::new("Selection.Next").with_id("next-sel"), 1),
                ),
        );
        let descriptor = Descriptor::new(ModuleNode::new("Controller.Sequential").with_slot("window", window));
        let mut h = Harness::new(&descriptor, fixtures::library(5)).unwrap();
        h.start();
        h.settle().await;

        h.click_item(fixtures::article(1), fixtures::articles(5));
        h.settle().await;
        assert_eq!(h.model_ids("prev-sel"), vec!["a00"]);
        assert_eq!(h.model_ids("next-sel"), vec!["a02"]);

        h.dispatch(Action::NextDocumentClicked);
        h.settle().await;
        let item = h.history().current_item().unwrap();
        assert_eq!(item.model_id(), Some("a02"));
        assert_eq!(item.direction, Direction::Forward);
        assert_eq!(h.model_ids("next-sel"), vec!["a03"]);
    })
    .await;
}

// ---------------------------------------------------------------------------
// History and dispatch laws
// ---------------------------------------------------------------------------

#[test]
fn test_history_stack_law() {
    let history = HistoryStore::new();
    let a = HistoryItem::article(ContentRecord::article("a", "A"));
    let b = HistoryItem::article(ContentRecord::article("b", "B"));
    let c = HistoryItem::article(ContentRecord::article("c", "C"));

    history.set_current_item(a.clone());
    history.set_current_item(b.clone());
    history.go_back();
    assert!(history.current_item().unwrap().equals(&a));
    assert!(history.forward_top().unwrap().equals(&b));

    history.set_current_item(c);
    assert!(!history.can_go_forward());
}

#[test]
fn test_dispatch_isolates_failing_handlers() {
    let dispatcher = Dispatcher::new();
    let delivered = Rc::new(Cell::new(0));
    let _failing = dispatcher.register(|_| Err(HandlerError::new("failing", "boom")));
    let counter = Rc::clone(&delivered);
    let _counting = dispatcher.register(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    dispatcher.dispatch(Action::HomeClicked);
    dispatcher.dispatch(Action::AllSetsClicked);
    assert_eq!(delivered.get(), 2);
    assert!(dispatcher.is_empty());
}

#[test]
fn test_modify_query_is_copy_on_write() {
    let reading: Rc<dyn ReadingHistory> = Rc::new(MemoryReadingHistory::with_read(["5"]));
    let filter = Unread::new(reading, false);
    let base = Query::new().with_tags_match_all(["A"]);

    let derived = filter.modify_query(&base);
    assert_eq!(derived.excluded_ids, vec!["5".to_string()]);
    assert_eq!(derived.tags_match_all, vec!["A".to_string()]);
    assert!(base.excluded_ids.is_empty());
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_from_toml() {
    let config = ComposeConfig::from_toml_str(
        r#"
        page_size = 6
        history_depth = 10
        "#,
    )
    .unwrap();
    assert_eq!(config.page_size, 6);
    assert_eq!(config.history_depth, 10);
    assert_eq!(config.filter_overfetch, 3);
}

// ---------------------------------------------------------------------------
// descriptor! macro
// ---------------------------------------------------------------------------

#[cfg(feature = "macros")]
#[test]
fn test_descriptor_macro_matches_builder() {
    use gilt_compose::descriptor;

    let from_macro = descriptor! {
        <ContentGroup.ContentGroup id="group" page_size=3>
            selection: <Selection.All id="sel">
                filter: [<Filter.Tagged tag="animals" />, <Filter.Featured invert=true />]
            </Selection.All>
            arrangement: <Arrangement.List>
                card: <Card.Default />
            </Arrangement.List>
        </ContentGroup.ContentGroup>
    };
    let by_hand = fixtures::group(
        "group",
        ModuleNode::new("Selection.All").with_id("sel").with_slot_list(
            "filter",
            vec![
                ModuleNode::new("Filter.Tagged").with_property("tag", "animals"),
                ModuleNode::new("Filter.Featured").with_property("invert", true),
            ],
        ),
        3,
    );
    assert_eq!(from_macro, by_hand);
}
