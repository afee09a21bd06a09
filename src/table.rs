//! Row rendering for a page of records.
//!
//! The table never talks to the remote. Row actions come back out as
//! [`ListIntent`]s for the controller to reduce.

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};

use crate::entity::{Capabilities, Entity};
use crate::list::{ListIntent, ListView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

/// A column definition: header text plus a field accessor.
pub struct Column<E> {
    pub header: &'static str,
    pub accessor: fn(&E) -> String,
    pub align: Align,
}

impl<E> Column<E> {
    pub fn new(header: &'static str, accessor: fn(&E) -> String) -> Self {
        Self {
            header,
            accessor,
            align: Align::Left,
        }
    }

    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }

    pub fn center(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn cell(&self, record: &E) -> String {
        (self.accessor)(record)
    }
}

impl<E> Clone for Column<E> {
    fn clone(&self) -> Self {
        Self {
            header: self.header,
            accessor: self.accessor,
            align: self.align,
        }
    }
}

impl<E> std::fmt::Debug for Column<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("header", &self.header)
            .field("align", &self.align)
            .finish()
    }
}

/// Per-row action offered by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    View,
    Edit,
    Delete,
    Toggle,
}

impl RowAction {
    pub fn available(capabilities: Capabilities) -> Vec<RowAction> {
        let mut actions = vec![RowAction::View];
        if capabilities.update {
            actions.push(RowAction::Edit);
        }
        if capabilities.toggle {
            actions.push(RowAction::Toggle);
        }
        if capabilities.delete {
            actions.push(RowAction::Delete);
        }
        actions
    }

    pub fn label(self) -> &'static str {
        match self {
            RowAction::View => "view",
            RowAction::Edit => "edit",
            RowAction::Delete => "delete",
            RowAction::Toggle => "toggle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row<Id> {
    pub id: Id,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
    /// A mutation on this row is in flight; its actions are disabled.
    pub busy: bool,
}

impl<Id: Clone> Row<Id> {
    /// Convert a row action into the intent the controller reduces. Busy
    /// rows produce nothing, mirroring a disabled button.
    pub fn intent<E>(&self, action: RowAction) -> Option<ListIntent<E>>
    where
        E: Entity<Id = Id>,
    {
        if self.busy || !self.actions.contains(&action) {
            return None;
        }
        let id = self.id.clone();
        Some(match action {
            RowAction::View => ListIntent::View(id),
            RowAction::Edit => ListIntent::Edit(id),
            RowAction::Delete => ListIntent::Delete(id),
            RowAction::Toggle => ListIntent::ToggleStatus(id),
        })
    }
}

/// Map a page of records to display rows.
pub fn build_rows<'a, E, I>(page: I, is_busy: impl Fn(&E::Id) -> bool) -> Vec<Row<E::Id>>
where
    E: Entity,
    I: IntoIterator<Item = &'a E>,
{
    let columns = E::columns();
    let actions = RowAction::available(E::CAPABILITIES);
    page.into_iter()
        .map(|record| Row {
            id: record.id().clone(),
            cells: columns.iter().map(|c| c.cell(record)).collect(),
            actions: actions.clone(),
            busy: is_busy(record.id()),
        })
        .collect()
}

/// Render a list view as a text table with a page footer.
pub fn render_text<E: Entity>(view: &ListView<E::Id>) -> String {
    let mut out = String::new();

    if view.rows.is_empty() {
        out.push_str(&format!("No {} found.", E::KIND.label()).dimmed().to_string());
    } else {
        let columns = E::columns();
        let mut builder = Builder::default();
        builder.push_record(columns.iter().map(|c| c.header.to_string()));
        for row in &view.rows {
            let mut cells = row.cells.clone();
            if row.busy
                && let Some(first) = cells.first_mut()
            {
                first.push_str(" *");
            }
            builder.push_record(cells);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        for (index, column) in columns.iter().enumerate() {
            let alignment = match column.align {
                Align::Left => Alignment::left(),
                Align::Right => Alignment::right(),
                Align::Center => Alignment::center(),
            };
            table.modify(Columns::new(index..index + 1), alignment);
        }
        out.push_str(&table.to_string());
    }

    out.push('\n');
    out.push_str(&format!(
        "Page {} of {} ({} {})",
        view.current_page, view.total_pages, view.filtered_count, E::KIND.label()
    ));
    out
}
