//! Module classes for the built-in selections.
//!
//! All selection types share the same slots: any number of filters and an
//! optional order.

use std::rc::Rc;

use super::state::Selection;
use super::source::SelectionSource;
use super::sources::{
    AllContent, AllSets, ContentForSet, FeaturedFirst, Related, SearchResults, Sibling, StaticIds,
    Step, Supplementary,
};
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, Constructor, ModuleClass, ModuleHandle, SlotSpec};

const SLOTS: &[SlotSpec] = &[
    SlotSpec::many("filter", Capability::Filter),
    SlotSpec::optional("order", Capability::Order),
];

const fn class(type_name: &'static str, construct: Constructor) -> ModuleClass {
    ModuleClass {
        type_name,
        capability: Capability::Selection,
        slots: SLOTS,
        references: &[],
        properties: &[],
        construct,
    }
}

/// Build a selection over `source` from the construction's slots and start
/// watching the context for staleness.
fn build(c: &mut Construction<'_>, source: Box<dyn SelectionSource>) -> ConfigResult<ModuleHandle> {
    let filters = c.filters("filter");
    let order = c.order("order");
    let context = Rc::clone(c.context());
    let selection = Rc::new(Selection::new(
        source,
        filters,
        order,
        context.config.filter_overfetch,
    ));
    selection.watch(&context);
    Ok(ModuleHandle::Selection(selection))
}

pub const ALL: ModuleClass = class("Selection.All", all);
pub const FEATURED: ModuleClass = class("Selection.Featured", featured);
pub const SEARCH: ModuleClass = class("Selection.Search", search);
pub const CONTENT_FOR_SET: ModuleClass = class("Selection.ContentForSet", content_for_set);
pub const ALL_SETS: ModuleClass = class("Selection.AllSets", all_sets);
pub const SUPPLEMENTARY: ModuleClass = class("Selection.Supplementary", supplementary);
pub const RELATED: ModuleClass = class("Selection.Related", related);
pub const NEXT: ModuleClass = class("Selection.Next", next);
pub const PREVIOUS: ModuleClass = class("Selection.Previous", previous);
pub const STATIC: ModuleClass = ModuleClass {
    properties: &["ids"],
    ..class("Selection.Static", static_ids)
};

fn all(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(AllContent))
}

fn featured(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(FeaturedFirst))
}

fn search(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(SearchResults::default()))
}

fn content_for_set(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(ContentForSet::default()))
}

fn all_sets(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(AllSets))
}

fn supplementary(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let reading = Rc::clone(&c.context().reading);
    build(c, Box::new(Supplementary::new(reading)))
}

fn related(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(Related::default()))
}

fn next(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(Sibling::new(Step::Next)))
}

fn previous(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    build(c, Box::new(Sibling::new(Step::Previous)))
}

fn static_ids(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let ids = c.str_list_property("ids")?;
    build(c, Box::new(StaticIds::new(ids)))
}
