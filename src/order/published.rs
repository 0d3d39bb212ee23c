//! Order.PublishedDate: by publication date, undated records first.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{compare_published, sort_order, Order, PROPERTIES};
use crate::content::{ContentRecord, Query, Sort};
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Order.PublishedDate",
    capability: Capability::Order,
    slots: &[],
    references: &[],
    properties: PROPERTIES,
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let ascending = c.bool_property("ascending", true)?;
    Ok(ModuleHandle::Order(Rc::new(PublishedDate::new(ascending))))
}

#[derive(Debug, Clone, Copy)]
pub struct PublishedDate {
    ascending: bool,
}

impl PublishedDate {
    pub fn new(ascending: bool) -> Self {
        Self { ascending }
    }
}

impl Referencing for PublishedDate {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Order for PublishedDate {
    fn ascending(&self) -> bool {
        self.ascending
    }

    fn compare_impl(&self, left: &ContentRecord, right: &ContentRecord) -> Ordering {
        compare_published(left, right)
    }

    fn modify_query(&self, query: &Query) -> Query {
        query.clone().with_sort(Sort::Date, sort_order(self.ascending))
    }
}
