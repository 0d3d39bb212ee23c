//! Filter.Featured: keeps featured records.

use std::rc::Rc;

use super::Filter;
use crate::content::{ContentRecord, Query};
use crate::error::ConfigResult;
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Filter.Featured",
    capability: Capability::Filter,
    slots: &[],
    references: &[],
    properties: &["invert"],
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let invert = c.bool_property("invert", false)?;
    Ok(ModuleHandle::Filter(Rc::new(Featured::new(invert))))
}

#[derive(Debug, Clone, Copy)]
pub struct Featured {
    invert: bool,
}

impl Featured {
    pub fn new(invert: bool) -> Self {
        Self { invert }
    }
}

impl Referencing for Featured {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Filter for Featured {
    fn invert(&self) -> bool {
        self.invert
    }

    fn include_impl(&self, record: &ContentRecord) -> bool {
        record.featured
    }

    /// Only fills in `featured` when the query leaves it open. A query that
    /// already asks for the other half is left alone and `include` drops its
    /// records.
    fn modify_query(&self, query: &Query) -> Query {
        if query.featured.is_some() {
            return query.clone();
        }
        query.clone().with_featured(Some(!self.invert))
    }
}
