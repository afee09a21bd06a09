//! Messages sent from the table (and the page around it) to the controller.
//!
//! [`reduce`] applies the intents that only touch local state and turns the
//! rest into an [`Effect`]; [`dispatch`] also runs the effect.

use crate::entity::Entity;
use crate::error::{AdminError, Result};
use crate::form::{FormMode, FormState};
use crate::list::controller::{ListController, LoadOutcome};
use crate::remote::RemoteCollaborator;

#[derive(Debug, Clone, PartialEq)]
pub enum ListIntent<E: Entity> {
    Search(String),
    SetPage(usize),
    NextPage,
    PreviousPage,
    SetFacet(E::Facet),
    Refresh,
    /// Open an empty create form
    Create,
    /// Open the edit form for a row
    Edit(E::Id),
    View(E::Id),
    Delete(E::Id),
    ToggleStatus(E::Id),
}

/// Side effect requested by an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<Id> {
    Load,
    OpenForm(FormMode<Id>),
    Show(Id),
    Delete(Id),
    Toggle(Id),
}

/// Result of dispatching an intent.
#[derive(Debug, Clone)]
pub enum Outcome<E: Entity> {
    /// Local state (search, facet, page) changed
    Updated,
    Loaded(LoadOutcome),
    Form(FormState<E>),
    Record(E),
    Deleted(E::Id),
    Saved(E),
}

/// Apply the local part of an intent and return the effect still to run.
///
/// Intents the entity does not support fail here, before anything else
/// happens.
pub fn reduce<E, R>(controller: &ListController<E, R>, intent: ListIntent<E>) -> Result<Option<Effect<E::Id>>>
where
    E: Entity,
    R: RemoteCollaborator<E>,
{
    let caps = E::CAPABILITIES;
    let unsupported = |operation: &'static str| AdminError::Unsupported {
        entity: E::KIND.label(),
        operation,
    };

    Ok(match intent {
        ListIntent::Search(term) => {
            controller.set_search_term(term);
            None
        }
        ListIntent::SetPage(page) => {
            controller.set_page(page);
            None
        }
        ListIntent::NextPage => {
            controller.next_page();
            None
        }
        ListIntent::PreviousPage => {
            controller.previous_page();
            None
        }
        ListIntent::SetFacet(facet) => {
            controller.set_facet(facet);
            None
        }
        ListIntent::Refresh => Some(Effect::Load),
        ListIntent::Create if caps.create => Some(Effect::OpenForm(FormMode::Create)),
        ListIntent::Create => return Err(unsupported("create")),
        ListIntent::Edit(id) if caps.update => Some(Effect::OpenForm(FormMode::Edit(id))),
        ListIntent::Edit(_) => return Err(unsupported("update")),
        ListIntent::View(id) => Some(Effect::Show(id)),
        ListIntent::Delete(id) if caps.delete => Some(Effect::Delete(id)),
        ListIntent::Delete(_) => return Err(unsupported("delete")),
        ListIntent::ToggleStatus(id) if caps.toggle => Some(Effect::Toggle(id)),
        ListIntent::ToggleStatus(_) => return Err(unsupported("toggle")),
    })
}

fn local_record<E, R>(controller: &ListController<E, R>, id: &E::Id) -> Result<E>
where
    E: Entity,
    R: RemoteCollaborator<E>,
{
    controller.get(id).ok_or_else(|| AdminError::NotFound {
        entity: E::KIND.singular(),
        id: id.to_string(),
    })
}

/// Run an effect against the controller.
pub async fn run_effect<E, R>(controller: &ListController<E, R>, effect: Effect<E::Id>) -> Result<Outcome<E>>
where
    E: Entity,
    R: RemoteCollaborator<E>,
{
    match effect {
        Effect::Load => controller.load().await.map(Outcome::Loaded),
        Effect::OpenForm(FormMode::Create) => Ok(Outcome::Form(FormState::create())),
        Effect::OpenForm(FormMode::Edit(id)) => {
            local_record(controller, &id).map(|record| Outcome::Form(FormState::edit(&record)))
        }
        Effect::Show(id) => local_record(controller, &id).map(Outcome::Record),
        Effect::Delete(id) => {
            controller.remove(&id).await?;
            Ok(Outcome::Deleted(id))
        }
        Effect::Toggle(id) => controller.toggle_status(&id).await.map(Outcome::Saved),
    }
}

/// Reduce an intent and run whatever effect it produces.
pub async fn dispatch<E, R>(controller: &ListController<E, R>, intent: ListIntent<E>) -> Result<Outcome<E>>
where
    E: Entity,
    R: RemoteCollaborator<E>,
{
    match reduce(controller, intent)? {
        Some(effect) => run_effect(controller, effect).await,
        None => Ok(Outcome::Updated),
    }
}
