//! Arrangement.List: one card per record, built from a template.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use super::{Arrangement, Card, Component};
use crate::content::ContentRecord;
use crate::error::ConfigResult;
use crate::event::Action;
use crate::module::{
    AppContext, Capability, Construction, ModuleClass, ModuleFactory, ModuleHandle, ModuleNode,
    Properties, Referencing, SlotSpec,
};

pub const LIST: ModuleClass = ModuleClass {
    type_name: "Arrangement.List",
    capability: Capability::Component,
    slots: &[SlotSpec::template("card", Capability::Component)],
    references: &[],
    properties: &["max_cards"],
    construct,
};

fn construct(c: &mut Construction<'_>) -> ConfigResult<ModuleHandle> {
    let max_cards = c.usize_property("max_cards", 0)?;
    let template = c.template("card")?;
    let list = ListArrangement {
        context: Rc::clone(c.context()),
        factory: c.factory().clone(),
        template,
        max_cards: (max_cards > 0).then_some(max_cards),
        cards: RefCell::new(Vec::new()),
        models: RefCell::new(Vec::new()),
    };
    Ok(ModuleHandle::Component(Rc::new(list)))
}

pub struct ListArrangement {
    context: Rc<AppContext>,
    factory: ModuleFactory,
    template: ModuleNode,
    /// `None` shows every model.
    max_cards: Option<usize>,
    cards: RefCell<Vec<(String, ModuleHandle)>>,
    models: RefCell<Vec<ContentRecord>>,
}

impl ListArrangement {
    pub fn max_cards(&self) -> Option<usize> {
        self.max_cards
    }

    /// Handles of the cards currently shown, in display order.
    pub fn cards(&self) -> Vec<ModuleHandle> {
        self.cards.borrow().iter().map(|(_, card)| card.clone()).collect()
    }

    pub fn card_ids(&self) -> Vec<String> {
        self.cards.borrow().iter().map(|(id, _)| id.clone()).collect()
    }

    /// The records currently shown.
    pub fn models(&self) -> Vec<ContentRecord> {
        self.models.borrow().clone()
    }

    /// Activate the card showing `id`, dispatching `item-clicked` with the
    /// shown records as context. Returns false when no such card is shown.
    pub fn activate(&self, id: &str) -> bool {
        let models = self.models();
        let Some(model) = models.iter().find(|m| m.id == id).cloned() else {
            return false;
        };
        self.context.dispatcher.dispatch(Action::item_clicked(model, models));
        true
    }

    fn card_for(&self, record: &ContentRecord) -> Option<ModuleHandle> {
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(err) => {
                warn!(id = %record.id, error = %err, "record is not serializable");
                return None;
            }
        };
        let extra = Properties::new().with("record", value);
        match self.factory.instantiate(&self.context, &self.template, &extra) {
            Ok(card) => Some(card),
            Err(err) => {
                warn!(id = %record.id, template = %self.template.type_name, error = %err, "card template failed");
                None
            }
        }
    }
}

impl Arrangement for ListArrangement {
    fn set_models(&self, models: &[ContentRecord]) {
        let shown = match self.max_cards {
            Some(max) => &models[..models.len().min(max)],
            None => models,
        };
        let mut previous = std::mem::take(&mut *self.cards.borrow_mut());
        let mut cards = Vec::with_capacity(shown.len());
        for record in shown {
            let reused = previous
                .iter()
                .position(|(id, _)| *id == record.id)
                .map(|at| previous.swap_remove(at).1);
            let card = match reused {
                Some(card) => {
                    if let Some(card) = card.downcast_component::<Card>() {
                        if card.record().as_ref() != Some(record) {
                            card.set_record(record.clone());
                        }
                    }
                    Some(card)
                }
                None => self.card_for(record),
            };
            if let Some(card) = card {
                cards.push((record.id.clone(), card));
            }
        }
        *self.cards.borrow_mut() = cards;
        *self.models.borrow_mut() = shown.to_vec();
    }

    fn card_count(&self) -> usize {
        self.cards.borrow().len()
    }
}

impl Referencing for ListArrangement {
    fn type_name(&self) -> &'static str {
        LIST.type_name
    }
}

impl Component for ListArrangement {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_arrangement(&self) -> Option<&dyn Arrangement> {
        Some(self)
    }
}
