//! Filter.Tagged: keeps records carrying a tag.

use std::rc::Rc;

use super::Filter;
use crate::content::{ContentRecord, Query};
use crate::error::{ConfigError, ConfigResult};
use crate::module::{Capability, Construction, ModuleClass, ModuleHandle, Referencing};

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "Filter.Tagged",
    capability: Capability::Filter,
    slots: &[],
    references: &[],
    properties: &["invert", "tag"],
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let invert = c.bool_property("invert", false)?;
    let tag = c.str_property("tag")?.ok_or_else(|| ConfigError::InvalidProperty {
        module_type: CLASS.type_name.to_string(),
        property: "tag".into(),
        reason: "a tag is required".into(),
    })?;
    Ok(ModuleHandle::Filter(Rc::new(Tagged::new(tag, invert))))
}

#[derive(Debug, Clone)]
pub struct Tagged {
    tag: String,
    invert: bool,
}

impl Tagged {
    pub fn new(tag: impl Into<String>, invert: bool) -> Self {
        Self {
            tag: tag.into(),
            invert,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Referencing for Tagged {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Filter for Tagged {
    fn invert(&self) -> bool {
        self.invert
    }

    fn include_impl(&self, record: &ContentRecord) -> bool {
        record.has_tag(&self.tag)
    }

    fn modify_query(&self, query: &Query) -> Query {
        if self.invert {
            query.clone().with_excluded_tags([self.tag.as_str()])
        } else {
            query.clone().with_tags_match_all([self.tag.as_str()])
        }
    }
}
