//! ContentGroup.ContentGroup: binds a selection to an arrangement.
//!
//! After every completed load cycle the group pushes the selection's models
//! into the arrangement. `load_more` asks for the next page, or follows the
//! selection's navigation action when it has one (an "all sets" group on the
//! home page opens the all-sets page instead of growing).

use std::any::Any;
use std::rc::{Rc, Weak};

use super::{Arrangement, Component};
use crate::error::{ConfigError, ConfigResult};
use crate::event::Subscription;
use crate::module::{
    AppContext, Capability, Construction, ModuleClass, ModuleHandle, Referencing, SlotSpec,
};
use crate::selection::Selection;

pub const CLASS: ModuleClass = ModuleClass {
    type_name: "ContentGroup.ContentGroup",
    capability: Capability::Component,
    slots: &[
        SlotSpec::required("selection", Capability::Selection),
        SlotSpec::required("arrangement", Capability::Component),
    ],
    references: &[],
    properties: &["page_size", "title"],
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let page_size = c.usize_property("page_size", c.context().config.page_size)?;
    if page_size == 0 {
        return Err(ConfigError::InvalidProperty {
            module_type: CLASS.type_name.to_string(),
            property: "page_size".into(),
            reason: "must be greater than zero".into(),
        });
    }
    let title = c.str_property("title")?.unwrap_or_default();
    let selection = c.selection("selection")?;
    let arrangement = c.component("arrangement")?;
    if arrangement.as_arrangement().is_none() {
        return Err(ConfigError::MalformedSlot {
            module_type: CLASS.type_name.to_string(),
            slot: "arrangement".into(),
            reason: format!("`{}` does not arrange cards", arrangement.type_name()),
        });
    }
    let group = ContentGroup::new(Rc::clone(c.context()), selection, arrangement, page_size, title);
    Ok(ModuleHandle::Component(Rc::new(group)))
}

pub struct ContentGroup {
    context: Rc<AppContext>,
    selection: Rc<Selection>,
    arrangement: Rc<dyn Component>,
    page_size: usize,
    title: String,
    _forward: Subscription,
}

impl ContentGroup {
    pub fn new(
        context: Rc<AppContext>,
        selection: Rc<Selection>,
        arrangement: Rc<dyn Component>,
        page_size: usize,
        title: String,
    ) -> Self {
        let forward = {
            let source: Weak<Selection> = Rc::downgrade(&selection);
            let target: Weak<dyn Component> = Rc::downgrade(&arrangement);
            selection.models_changed().connect(move |_| {
                let (Some(selection), Some(target)) = (source.upgrade(), target.upgrade()) else {
                    return;
                };
                if let Some(arrangement) = target.as_arrangement() {
                    arrangement.set_models(&selection.models());
                }
            })
        };
        Self {
            context,
            selection,
            arrangement,
            page_size,
            title,
            _forward: forward,
        }
    }

    pub fn selection(&self) -> &Rc<Selection> {
        &self.selection
    }

    pub fn arrangement(&self) -> &Rc<dyn Component> {
        &self.arrangement
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ask for one more page. Returns whether a fetch was started.
    pub fn load_more(&self) -> bool {
        self.context.loader.show_more(
            &self.selection,
            self.page_size,
            &self.context.dispatcher,
            &self.context.history,
        )
    }
}

impl Referencing for ContentGroup {
    fn type_name(&self) -> &'static str {
        CLASS.type_name
    }
}

impl Component for ContentGroup {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
