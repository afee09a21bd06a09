//! Create/edit form state machine.
//!
//! ```text
//! Empty ──edit──▶ Editing ──submit──▶ Validating ──ok──▶ Submitting ──▶ Success
//!                    ▲                    │                   │
//!                    └───────edit─────── Failed ◀─────────────┘
//! ```
//!
//! The draft survives every failure. Local rule violations and server-side
//! field errors both end up in [`FormState::errors`], keyed by field name.

pub mod rules;

use std::fmt;

use tracing::debug;

use crate::entity::Entity;
use crate::error::{AdminError, FieldErrors, Result};
use crate::list::ListController;
use crate::remote::RemoteCollaborator;

pub use rules::{Draft, FieldKind, FieldSpec, FieldValue, Rule, validate_draft};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode<Id> {
    Create,
    Edit(Id),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Fresh create form, nothing entered yet
    Empty,
    Editing,
    Validating,
    Submitting,
    Success,
    Failed,
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormPhase::Empty => "empty",
            FormPhase::Editing => "editing",
            FormPhase::Validating => "validating",
            FormPhase::Submitting => "submitting",
            FormPhase::Success => "success",
            FormPhase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct FormState<E: Entity> {
    mode: FormMode<E::Id>,
    phase: FormPhase,
    draft: Draft,
    errors: FieldErrors,
    notice: Option<String>,
    saved: Option<E>,
}

impl<E: Entity> FormState<E> {
    /// Empty create form.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            phase: FormPhase::Empty,
            draft: Draft::empty(E::form_schema()),
            errors: FieldErrors::new(),
            notice: None,
            saved: None,
        }
    }

    /// Edit form prefilled from `record`.
    pub fn edit(record: &E) -> Self {
        Self {
            mode: FormMode::Edit(record.id().clone()),
            phase: FormPhase::Editing,
            draft: record.to_draft(),
            errors: FieldErrors::new(),
            notice: None,
            saved: None,
        }
    }

    pub fn mode(&self) -> &FormMode<E::Id> {
        &self.mode
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.get(field)
    }

    /// General message not tied to a field.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Record returned by the last successful submit.
    pub fn saved(&self) -> Option<&E> {
        self.saved.as_ref()
    }

    /// The form stays open until a submit succeeds.
    pub fn is_open(&self) -> bool {
        self.phase != FormPhase::Success
    }

    fn spec(&self, name: &str) -> Result<&'static FieldSpec> {
        E::form_schema()
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| {
                AdminError::InvalidInput(format!(
                    "{} form has no field '{}'",
                    E::KIND.singular(),
                    name
                ))
            })
    }

    /// Change one field. Clears that field's error and returns a failed or
    /// fresh form to `Editing`.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        if self.phase == FormPhase::Submitting {
            return Err(AdminError::Busy(format!("{} form", E::KIND.singular())));
        }
        let spec = self.spec(name)?;
        self.draft.set(spec.name, value);
        self.errors.remove(spec.name);
        self.phase = FormPhase::Editing;
        Ok(())
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.set_field(name, FieldValue::Text(value.into()))
    }

    /// Apply `field=value` style input, parsed per field kind.
    pub fn apply_assignments<'a, I>(&mut self, assignments: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, raw) in assignments {
            let spec = self.spec(name.trim())?;
            let value = FieldValue::parse(spec.kind, raw)?;
            self.set_field(spec.name, value)?;
        }
        Ok(())
    }

    /// Run the field rules. On failure the form moves to `Failed` with the
    /// offending fields annotated; the draft is left as is.
    pub fn validate(&mut self) -> bool {
        self.phase = FormPhase::Validating;
        self.errors = validate_draft(E::form_schema(), &self.draft);
        if self.errors.is_empty() {
            true
        } else {
            debug!(form = E::KIND.singular(), errors = %self.errors, "validation failed");
            self.phase = FormPhase::Failed;
            false
        }
    }

    /// Validate and, if clean, create or update through the controller.
    ///
    /// Nothing is sent when validation fails. A rejected submit maps the
    /// server's field errors onto matching fields; messages for fields the
    /// form does not have become the notice.
    pub async fn submit<R>(&mut self, controller: &ListController<E, R>) -> Result<E>
    where
        R: RemoteCollaborator<E>,
    {
        if self.phase == FormPhase::Submitting {
            return Err(AdminError::Busy(format!("{} form", E::KIND.singular())));
        }
        self.notice = None;
        if !self.validate() {
            return Err(AdminError::Validation(self.errors.clone()));
        }

        self.phase = FormPhase::Submitting;
        let payload = E::payload(&self.draft);
        let result = match &self.mode {
            FormMode::Create => controller.create(&payload).await,
            FormMode::Edit(id) => controller.update(id, &payload).await,
        };

        match result {
            Ok(record) => {
                self.phase = FormPhase::Success;
                self.errors.clear();
                self.saved = Some(record.clone());
                Ok(record)
            }
            Err(err) => {
                self.absorb(&err);
                self.phase = FormPhase::Failed;
                Err(err)
            }
        }
    }

    fn absorb(&mut self, err: &AdminError) {
        let Some(fields) = err.field_errors() else {
            self.notice = Some(err.to_string());
            return;
        };

        let schema = E::form_schema();
        let mut unmatched = Vec::new();
        for (field, message) in fields.iter() {
            // Array fields come back as `permissions.0`.
            let base = field.split('.').next().unwrap_or(field);
            match schema.iter().find(|spec| spec.name == base) {
                Some(spec) => self.errors.insert(spec.name, message),
                None => unmatched.push(format!("{field}: {message}")),
            }
        }
        self.notice = (!unmatched.is_empty()).then(|| unmatched.join("; "));
    }
}
