//! Single-record commands: show, create, update, delete, toggle.

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, Session, emit_notice, print_field_errors, record_json, render_record};
use crate::cli::OutputOptions;
use crate::entity::{Entity, EntityKind};
use crate::error::{AdminError, Result};
use crate::form::FormState;
use crate::list::{ListController, ListIntent, Outcome, dispatch};
use crate::remote::RestClient;

fn unexpected(outcome: &str) -> AdminError {
    AdminError::InvalidInput(format!("unexpected {outcome} outcome"))
}

fn record_output<E: Entity>(record: &E, headline: String) -> Result<CommandOutput> {
    Ok(CommandOutput::new(record_json(record)?)
        .with_text(format!("{headline}\n{}", render_record(record))))
}

pub async fn cmd_show(kind: EntityKind, id: &str, output: OutputOptions) -> Result<()> {
    crate::with_entity!(kind, E => show_typed::<E>(id, output).await)
}

async fn show_typed<E: Entity>(raw_id: &str, output: OutputOptions) -> Result<()> {
    let id = E::parse_id(raw_id)?;
    let session = Session::authenticated()?;
    let controller = session.controller::<E>();

    let result = async {
        dispatch(&controller, ListIntent::Refresh).await?;
        match dispatch(&controller, ListIntent::View(id)).await? {
            Outcome::Record(record) => Ok(record),
            _ => Err(unexpected("view")),
        }
    }
    .await;
    let record = session.finish(result)?;

    record_output(&record, format!("{} {}", E::KIND.singular().bold(), record.id()))?.print(output)
}

/// Fill the form from `--set` pairs and submit it. Validation failures are
/// printed per field and nothing is sent.
async fn fill_and_submit<E: Entity>(
    controller: &ListController<E, RestClient>,
    mut form: FormState<E>,
    fields: &[(String, String)],
) -> Result<E> {
    form.apply_assignments(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    match form.submit(controller).await {
        Ok(record) => Ok(record),
        Err(err) => {
            if !form.errors().is_empty() {
                eprintln!("{}", "Form has errors:".red());
                print_field_errors(form.errors());
            }
            if let Some(notice) = form.notice() {
                eprintln!("{}", notice.yellow());
            }
            Err(err)
        }
    }
}

pub async fn cmd_create(kind: EntityKind, fields: &[(String, String)], output: OutputOptions) -> Result<()> {
    crate::with_entity!(kind, E => create_typed::<E>(fields, output).await)
}

async fn create_typed<E: Entity>(fields: &[(String, String)], output: OutputOptions) -> Result<()> {
    let session = Session::authenticated()?;
    let controller = session.controller::<E>();

    let result = async {
        let form = match dispatch(&controller, ListIntent::Create).await? {
            Outcome::Form(form) => form,
            _ => return Err(unexpected("create")),
        };
        fill_and_submit(&controller, form, fields).await
    }
    .await;
    let notice = controller.take_notice();
    let record = session.finish(result)?;

    emit_notice(notice, output);
    record_output(&record, format!("Created {} {}", E::KIND.singular(), record.id().to_string().cyan()))?
        .print(output)
}

pub async fn cmd_update(
    kind: EntityKind,
    id: &str,
    fields: &[(String, String)],
    output: OutputOptions,
) -> Result<()> {
    crate::with_entity!(kind, E => update_typed::<E>(id, fields, output).await)
}

async fn update_typed<E: Entity>(raw_id: &str, fields: &[(String, String)], output: OutputOptions) -> Result<()> {
    let id = E::parse_id(raw_id)?;
    let session = Session::authenticated()?;
    let controller = session.controller::<E>();

    let result = async {
        dispatch(&controller, ListIntent::Refresh).await?;
        let form = match dispatch(&controller, ListIntent::Edit(id)).await? {
            Outcome::Form(form) => form,
            _ => return Err(unexpected("edit")),
        };
        fill_and_submit(&controller, form, fields).await
    }
    .await;
    let notice = controller.take_notice();
    let record = session.finish(result)?;

    emit_notice(notice, output);
    record_output(&record, format!("Updated {} {}", E::KIND.singular(), record.id().to_string().cyan()))?
        .print(output)
}

pub async fn cmd_delete(kind: EntityKind, id: &str, output: OutputOptions) -> Result<()> {
    crate::with_entity!(kind, E => delete_typed::<E>(id, output).await)
}

async fn delete_typed<E: Entity>(raw_id: &str, output: OutputOptions) -> Result<()> {
    let id = E::parse_id(raw_id)?;
    let session = Session::authenticated()?;
    let controller = session.controller::<E>();

    let result = dispatch(&controller, ListIntent::Delete(id)).await;
    let notice = controller.take_notice();
    let deleted = match session.finish(result)? {
        Outcome::Deleted(id) => id,
        _ => return Err(unexpected("delete")),
    };

    emit_notice(notice, output);
    CommandOutput::new(json!({
        "entity": E::KIND.label(),
        "id": deleted,
        "deleted": true,
    }))
    .with_text(format!("Deleted {} {}", E::KIND.singular(), deleted.to_string().cyan()))
    .print(output)
}

pub async fn cmd_toggle(kind: EntityKind, id: &str, output: OutputOptions) -> Result<()> {
    crate::with_entity!(kind, E => toggle_typed::<E>(id, output).await)
}

async fn toggle_typed<E: Entity>(raw_id: &str, output: OutputOptions) -> Result<()> {
    let id = E::parse_id(raw_id)?;
    let session = Session::authenticated()?;
    let controller = session.controller::<E>();

    let result = async {
        // Fail on unsupported collections before fetching anything.
        crate::list::reduce(&controller, ListIntent::ToggleStatus(id.clone()))?;
        dispatch(&controller, ListIntent::Refresh).await?;
        match dispatch(&controller, ListIntent::ToggleStatus(id)).await? {
            Outcome::Saved(record) => Ok(record),
            _ => Err(unexpected("toggle")),
        }
    }
    .await;
    let notice = controller.take_notice();
    let record = session.finish(result)?;

    emit_notice(notice, output);
    record_output(&record, format!("Toggled {} {}", E::KIND.singular(), record.id().to_string().cyan()))?
        .print(output)
}
