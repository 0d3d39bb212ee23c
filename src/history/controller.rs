//! Navigation policies: map dispatcher actions to history transitions.
//!
//! A policy is a dispatcher handler bound to one [`HistoryStore`]. Two
//! policies exist:
//!
//! - [`NavigationPolicy::Mesh`]: free navigation between home, sets, search
//!   results, and articles.
//! - [`NavigationPolicy::Sequential`]: a linear reader that walks the current
//!   item's context list with next/previous.

use std::rc::Rc;

use tracing::debug;

use super::item::{Direction, HistoryItem, PageType};
use super::store::HistoryStore;
use crate::content::{ContentRecord, ReadingHistory};
use crate::error::HandlerError;
use crate::event::{Action, Dispatcher, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Mesh,
    Sequential,
}

impl NavigationPolicy {
    fn name(self) -> &'static str {
        match self {
            NavigationPolicy::Mesh => "controller.mesh",
            NavigationPolicy::Sequential => "controller.sequential",
        }
    }
}

/// Register `policy` on `dispatcher`. The policy stays active for as long as
/// the returned subscription is alive.
pub fn install(
    policy: NavigationPolicy,
    dispatcher: &Dispatcher,
    history: Rc<HistoryStore>,
    reading: Rc<dyn ReadingHistory>,
) -> Subscription {
    debug!(policy = policy.name(), "installing navigation policy");
    dispatcher.register(move |action| match policy {
        NavigationPolicy::Mesh => mesh(action, &history, reading.as_ref()),
        NavigationPolicy::Sequential => sequential(action, &history, reading.as_ref()),
    })
}

fn open_item(
    history: &HistoryStore,
    reading: &dyn ReadingHistory,
    model: &ContentRecord,
    context: &[ContentRecord],
) {
    if model.is_set() {
        history.set_current_item(HistoryItem::set_page(model.clone()));
        return;
    }
    reading.mark_read(&model.id);
    let mut item = HistoryItem::article(model.clone()).with_context(context.to_vec());
    if let Some(set) = history.current_set() {
        item = item.with_set(set);
    }
    history.set_current_item(item);
}

fn mesh(
    action: &Action,
    history: &HistoryStore,
    reading: &dyn ReadingHistory,
) -> Result<(), HandlerError> {
    match action {
        Action::HomeClicked => history.set_current_item(HistoryItem::home()),
        Action::AllSetsClicked => history.set_current_item(HistoryItem::new(PageType::AllSets)),
        Action::SetClicked { model } => {
            history.set_current_item(HistoryItem::set_page(model.clone()))
        }
        Action::ItemClicked { model, context } => open_item(history, reading, model, context),
        Action::SearchTextEntered { text } => history.do_search(text),
        Action::HistoryBackClicked => history.go_back(),
        Action::HistoryForwardClicked => history.go_forward(),
        _ => {}
    }
    Ok(())
}

fn sequential(
    action: &Action,
    history: &HistoryStore,
    reading: &dyn ReadingHistory,
) -> Result<(), HandlerError> {
    match action {
        Action::HomeClicked => history.set_current_item(HistoryItem::home()),
        Action::ItemClicked { model, context } => open_item(history, reading, model, context),
        Action::NextDocumentClicked => step(history, reading, 1)?,
        Action::PreviousDocumentClicked => step(history, reading, -1)?,
        Action::HistoryBackClicked => history.go_back(),
        Action::HistoryForwardClicked => history.go_forward(),
        _ => {}
    }
    Ok(())
}

/// Move `offset` places along the current item's context list.
fn step(history: &HistoryStore, reading: &dyn ReadingHistory, offset: isize) -> Result<(), HandlerError> {
    let name = NavigationPolicy::Sequential.name();
    let current = history
        .current_item()
        .ok_or_else(|| HandlerError::new(name, "no current item"))?;
    let position = current
        .context_position()
        .ok_or_else(|| HandlerError::new(name, "current item has no position in its context"))?;

    let Some(target) = position
        .checked_add_signed(offset)
        .and_then(|i| current.context.get(i))
    else {
        debug!(position, offset, "already at the end of the context");
        return Ok(());
    };

    reading.mark_read(&target.id);
    let mut item = HistoryItem::article(target.clone()).with_context(current.context.clone());
    if let Some(set) = current.set.clone() {
        item = item.with_set(set);
    }
    let direction = if offset < 0 {
        Direction::Back
    } else {
        Direction::Forward
    };
    history.push_item(item, direction);
    Ok(())
}
