//! Order.Sequence: by the records' numeric sequence field.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{compare_sequence, sort_order, Order, PROPERTIES};
use crate::content::{ContentRecord, Query, Sort};
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Order.Sequence",
    capability: Capability::Order,
    slots: &[],
    references: &[],
    properties: PROPERTIES,
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let ascending = c.bool_property("ascending", true)?;
    Ok(ModuleHandle::Order(Rc::new(Sequence::new(ascending))))
}

#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    ascending: bool,
}

impl Sequence {
    pub fn new(ascending: bool) -> Self {
        Self { ascending }
    }
}

impl Referencing for Sequence {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Order for Sequence {
    fn ascending(&self) -> bool {
        self.ascending
    }

    fn compare_impl(&self, left: &ContentRecord, right: &ContentRecord) -> Ordering {
        compare_sequence(left, right)
    }

    fn modify_query(&self, query: &Query) -> Query {
        query.clone().with_sort(Sort::Sequence, sort_order(self.ascending))
    }
}
