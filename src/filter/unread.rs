//! Filter.Unread: keeps records the user has not read yet.

use std::rc::Rc;

use super::Filter;
use crate::content::{ContentRecord, Query, ReadingHistory};
use crate::error::ConfigResult;
use crate::event::{Emitter, Subscription};
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Filter.Unread",
    capability: Capability::Filter,
    slots: &[],
    references: &[],
    properties: &["invert"],
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let invert = c.bool_property("invert", false)?;
    let reading = Rc::clone(&c.context().reading);
    Ok(ModuleHandle::Filter(Rc::new(Unread::new(reading, invert))))
}

pub struct Unread {
    reading: Rc<dyn ReadingHistory>,
    invert: bool,
    changed: Emitter<()>,
    _forward: Subscription,
}

impl Unread {
    pub fn new(reading: Rc<dyn ReadingHistory>, invert: bool) -> Self {
        let changed = Emitter::new();
        let forward = {
            let changed = changed.clone();
            reading.changed().connect(move |_| changed.emit(&()))
        };
        Self {
            reading,
            invert,
            changed,
            _forward: forward,
        }
    }
}

impl Referencing for Unread {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Filter for Unread {
    fn invert(&self) -> bool {
        self.invert
    }

    fn include_impl(&self, record: &ContentRecord) -> bool {
        !self.reading.is_read(&record.id)
    }

    fn modify_query(&self, query: &Query) -> Query {
        if self.invert {
            return query.clone();
        }
        query.clone().with_excluded_ids(self.reading.all_read_ids())
    }

    fn changed(&self) -> Option<&Emitter<()>> {
        Some(&self.changed)
    }
}
