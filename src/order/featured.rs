//! Order.Featured: featured records first.
//!
//! The engine has no featured sort, so this order never touches the query and
//! relies on the in-memory merge alone.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{compare_featured, Order, PROPERTIES};
use crate::content::ContentRecord;
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Order.Featured",
    capability: Capability::Order,
    slots: &[],
    references: &[],
    properties: PROPERTIES,
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let ascending = c.bool_property("ascending", true)?;
    Ok(ModuleHandle::Order(Rc::new(FeaturedFirst::new(ascending))))
}

#[derive(Debug, Clone, Copy)]
pub struct FeaturedFirst {
    ascending: bool,
}

impl FeaturedFirst {
    pub fn new(ascending: bool) -> Self {
        Self { ascending }
    }
}

impl Referencing for FeaturedFirst {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Order for FeaturedFirst {
    fn ascending(&self) -> bool {
        self.ascending
    }

    fn compare_impl(&self, left: &ContentRecord, right: &ContentRecord) -> Ordering {
        compare_featured(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Query;

    #[test]
    fn stable_sort_keeps_arrival_order_among_ties() {
        let order = FeaturedFirst::new(true);
        let mut records = vec![
            ContentRecord::new("a"),
            ContentRecord::new("b").featured(true),
            ContentRecord::new("c"),
            ContentRecord::new("d").featured(true),
        ];
        records.sort_by(|a, b| order.compare(a, b));
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn query_untouched() {
        let q = Query::new().with_tags_match_all(["x"]);
        assert_eq!(FeaturedFirst::new(true).modify_query(&q), q);
    }
}
