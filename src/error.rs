use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field-level error messages keyed by field name.
///
/// Ordered so that rendering (CLI output, form annotations) is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl FromIterator<(String, String)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A list or read request failed. The caller's collection is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load {collection}: {message}")]
pub struct FetchError {
    pub collection: String,
    pub message: String,
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// A create/update/delete/toggle request failed on the server side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The server rejected the payload (HTTP 4xx), possibly with per-field detail.
    #[error("{message}")]
    Rejected { message: String, fields: FieldErrors },

    /// Server error or transport failure. Nothing field-specific to report.
    #[error("request failed: {0}")]
    Failed(String),
}

impl MutationError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            MutationError::Rejected { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Local form validation failed; nothing was sent to the server.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("'{operation}' is not supported for {entity}")]
    Unsupported {
        entity: &'static str,
        operation: &'static str,
    },

    #[error("another operation on {0} is still in flight")]
    Busy(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AdminError {
    /// Field errors carried by this error, local or server-side.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AdminError::Validation(fields) => Some(fields),
            AdminError::Mutation(err) => err.field_errors(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_display_is_sorted() {
        let mut errors = FieldErrors::new();
        errors.insert("name", "Name is required");
        errors.insert("email", "Wrong email format");
        assert_eq!(
            errors.to_string(),
            "email: Wrong email format; name: Name is required"
        );
    }

    #[test]
    fn test_rejected_without_fields_has_no_field_errors() {
        let err = MutationError::Rejected {
            message: "Forbidden".to_string(),
            fields: FieldErrors::new(),
        };
        assert!(err.field_errors().is_none());
        assert!(AdminError::from(err).field_errors().is_none());
    }

    #[test]
    fn test_fetch_error_message() {
        let err = FetchError::new("users", "HTTP 500").with_status(500);
        assert_eq!(err.to_string(), "failed to load users: HTTP 500");
        assert_eq!(err.status, Some(500));
    }
}
