use serde_json::json;

use super::{CommandOutput, Session, emit_notice};
use crate::cli::OutputOptions;
use crate::entity::{Entity, EntityKind};
use crate::error::Result;
use crate::list::{ListController, ListIntent, dispatch};
use crate::remote::RestClient;
use crate::table::render_text;

/// Options for `kcadmin list`
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub search: Option<String>,
    pub tab: Option<String>,
    pub page: usize,
    pub page_size: Option<usize>,
}

pub async fn cmd_list(kind: EntityKind, options: ListOptions, output: OutputOptions) -> Result<()> {
    crate::with_entity!(kind, E => list_typed::<E>(options, output).await)
}

async fn list_typed<E: Entity>(options: ListOptions, output: OutputOptions) -> Result<()> {
    let session = Session::authenticated()?;
    let controller = session.controller::<E>();
    let result = show_page(&controller, options).await;
    let notice = controller.take_notice();
    session.finish(result)?;

    let view = controller.view();
    let json_output = json!({
        "entity": E::KIND.label(),
        "page": view.current_page,
        "total_pages": view.total_pages,
        "page_size": view.page_size,
        "filtered_count": view.filtered_count,
        "total_count": view.total_count,
        "search": view.search_term,
        "tab": view.facet,
        "records": controller.page_records(),
    });
    emit_notice(notice, output);
    CommandOutput::new(json_output)
        .with_text(render_text::<E>(&view))
        .print(output)
}

/// Load, then apply tab, search and page in the order a user would.
async fn show_page<E: Entity>(controller: &ListController<E, RestClient>, options: ListOptions) -> Result<()> {
    // Parse the tab before touching the network.
    let facet = options.tab.as_deref().map(str::parse::<E::Facet>).transpose()?;

    dispatch(controller, ListIntent::Refresh).await?;
    if let Some(facet) = facet {
        dispatch(controller, ListIntent::SetFacet(facet)).await?;
    }
    if let Some(term) = options.search {
        dispatch(controller, ListIntent::Search(term)).await?;
    }
    if let Some(page_size) = options.page_size {
        controller.set_page_size(page_size);
    }
    dispatch(controller, ListIntent::SetPage(options.page)).await?;
    Ok(())
}
