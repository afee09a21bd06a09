//! Translation of HTTP failures into the crate's error taxonomy.
//!
//! The same transport failure means different things depending on the
//! operation: a failed list is a [`FetchError`] that leaves the collection
//! alone, a failed create or update is a [`MutationError`] the form can map
//! back onto its fields.

use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{AdminError, FetchError, FieldErrors, MutationError};

/// Error returned by the dashboard API or the transport beneath it.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code, if a response was received
    pub status: Option<StatusCode>,
    pub message: String,
    /// Per-field messages from a validation response
    pub fields: FieldErrors,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    pub fn with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    /// Build from a non-success response body.
    ///
    /// Understands the Laravel shape
    /// `{"message": "...", "errors": {"field": ["msg", ...]}}` and falls back
    /// to the raw body or the status reason.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("error")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|m| !m.trim().is_empty())
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && parsed.is_none() && trimmed.len() <= 200)
                    .then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )
            });

        let mut fields = FieldErrors::new();
        if let Some(Value::Object(errors)) = parsed.as_ref().and_then(|v| v.get("errors")) {
            for (field, messages) in errors {
                let first = match messages {
                    Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                };
                if let Some(first) = first {
                    fields.insert(field.clone(), first);
                }
            }
        }

        Self {
            status: Some(status),
            message,
            fields,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == Some(StatusCode::FORBIDDEN)
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_client_error())
    }

    fn auth_error(&self) -> Option<AdminError> {
        if self.is_unauthorized() {
            Some(AdminError::Auth(format!(
                "session expired or token invalid ({}); run `kcadmin login`",
                self.message
            )))
        } else if self.is_forbidden() {
            Some(AdminError::Auth(format!("forbidden: {}", self.message)))
        } else {
            None
        }
    }

    /// Classify as a failure to load `collection`.
    pub fn into_fetch_error(self, collection: &str) -> AdminError {
        if let Some(err) = self.auth_error() {
            return err;
        }
        let mut err = FetchError::new(collection, self.message);
        if let Some(status) = self.status {
            err = err.with_status(status.as_u16());
        }
        AdminError::Fetch(err)
    }

    /// Classify as a failed mutation of the record `id` (if any) of `entity`.
    pub fn into_mutation_error(self, entity: &'static str, id: Option<String>) -> AdminError {
        if let Some(err) = self.auth_error() {
            return err;
        }
        if self.status == Some(StatusCode::NOT_FOUND)
            && let Some(id) = id
        {
            return AdminError::NotFound { entity, id };
        }
        if self.is_client_error() {
            AdminError::Mutation(MutationError::Rejected {
                message: self.message,
                fields: self.fields,
            })
        } else {
            AdminError::Mutation(MutationError::Failed(self.message))
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({})", self.message, status.as_u16()),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            "could not connect to the server".to_string()
        } else if error.is_decode() {
            format!("invalid response body: {error}")
        } else {
            error.to_string()
        };
        Self {
            status: error.status(),
            message,
            fields: FieldErrors::new(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(format!("invalid response body: {error}"))
    }
}
