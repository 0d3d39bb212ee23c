//! Order.Alphabetical: by title.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{compare_titles, sort_order, Order, PROPERTIES};
use crate::content::{ContentRecord, Query, Sort};
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Order.Alphabetical",
    capability: Capability::Order,
    slots: &[],
    references: &[],
    properties: PROPERTIES,
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let ascending = c.bool_property("ascending", true)?;
    Ok(ModuleHandle::Order(Rc::new(Alphabetical::new(ascending))))
}

#[derive(Debug, Clone, Copy)]
pub struct Alphabetical {
    ascending: bool,
}

impl Alphabetical {
    pub fn new(ascending: bool) -> Self {
        Self { ascending }
    }
}

impl Referencing for Alphabetical {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Order for Alphabetical {
    fn ascending(&self) -> bool {
        self.ascending
    }

    fn compare_impl(&self, left: &ContentRecord, right: &ContentRecord) -> Ordering {
        compare_titles(left, right)
    }

    fn modify_query(&self, query: &Query) -> Query {
        query.clone().with_sort(Sort::Title, sort_order(self.ascending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SortOrder;

    #[test]
    fn pushes_title_sort() {
        let q = Alphabetical::new(false).modify_query(&Query::new());
        assert_eq!(q.sort, Sort::Title);
        assert_eq!(q.order, SortOrder::Descending);
    }

    #[test]
    fn sorts_case_insensitively() {
        let mut records = vec![
            ContentRecord::article("1", "beta"),
            ContentRecord::article("2", "Alpha"),
            ContentRecord::article("3", "gamma"),
        ];
        let order = Alphabetical::new(true);
        records.sort_by(|a, b| order.compare(a, b));
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "beta", "gamma"]);
    }
}
