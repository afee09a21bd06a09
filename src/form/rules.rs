//! Field schemas and the validation rules attached to them.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{AdminError, FieldErrors, Result};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex should be valid")
});

/// How a form field is entered and encoded in the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Number,
    /// Multi-select; entered comma separated on the command line.
    List,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    PositiveNumber,
    MinItems(usize),
}

impl Rule {
    /// Check a single value. Returns the error message on failure.
    ///
    /// Every rule except `Required` and `MinItems` passes on empty input so
    /// that optional fields may be left blank.
    pub fn check(&self, spec: &FieldSpec, value: &FieldValue) -> Option<String> {
        let text = value.as_text().map(str::trim);
        let blank = value.is_blank();

        match self {
            Rule::Required if blank => Some(format!("{} is required", spec.label)),
            Rule::Required => None,
            _ if blank && !matches!(self, Rule::MinItems(_)) => None,
            Rule::MinLength(min) => text
                .filter(|t| t.chars().count() < *min)
                .map(|_| format!("Minimum {min} characters")),
            Rule::MaxLength(max) => text
                .filter(|t| t.chars().count() > *max)
                .map(|_| format!("Maximum {max} characters")),
            Rule::Email => text
                .filter(|t| !EMAIL_RE.is_match(t))
                .map(|_| "Wrong email format".to_string()),
            Rule::PositiveNumber => match text.map(str::parse::<f64>) {
                Some(Ok(n)) if n > 0.0 && n.is_finite() => None,
                Some(Ok(_)) => Some(format!("{} must be a positive number", spec.label)),
                _ => Some(format!("{} must be a number", spec.label)),
            },
            Rule::MinItems(min) => {
                let count = match value {
                    FieldValue::List(items) => items.iter().filter(|i| !i.trim().is_empty()).count(),
                    other if other.is_blank() => 0,
                    _ => 1,
                };
                if count < *min {
                    if *min == 1 {
                        Some(format!("Select at least one {}", spec.item_noun()))
                    } else {
                        Some(format!("Select at least {min} {}", spec.label.to_lowercase()))
                    }
                } else {
                    None
                }
            }
        }
    }
}

/// One field of an entity form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        label: &'static str,
        kind: FieldKind,
        rules: &'static [Rule],
    ) -> Self {
        Self {
            name,
            label,
            kind,
            rules,
        }
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// First failing rule's message, if any.
    pub fn validate(&self, value: &FieldValue) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.check(self, value))
    }

    fn item_noun(&self) -> String {
        let lower = self.label.to_lowercase();
        lower.strip_suffix('s').map(str::to_string).unwrap_or(lower)
    }
}

/// A single value held by a draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
            FieldValue::Flag(_) => false,
        }
    }

    /// Parse raw user input for a field of the given kind.
    pub fn parse(kind: FieldKind, raw: &str) -> Result<FieldValue> {
        Ok(match kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Number => {
                FieldValue::Text(raw.to_string())
            }
            FieldKind::List => FieldValue::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            FieldKind::Flag => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => FieldValue::Flag(true),
                "false" | "no" | "0" | "off" => FieldValue::Flag(false),
                other => {
                    return Err(AdminError::InvalidInput(format!(
                        "expected true or false, got '{other}'"
                    )));
                }
            },
        })
    }

    fn empty(kind: FieldKind) -> FieldValue {
        match kind {
            FieldKind::List => FieldValue::List(Vec::new()),
            FieldKind::Flag => FieldValue::Flag(false),
            _ => FieldValue::Text(String::new()),
        }
    }

    fn from_json(kind: FieldKind, value: &Value) -> FieldValue {
        match (kind, value) {
            (_, Value::Null) => FieldValue::empty(kind),
            (FieldKind::List, Value::Array(items)) => FieldValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        Value::Object(obj) => obj
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            (FieldKind::Flag, Value::Bool(b)) => FieldValue::Flag(*b),
            (_, Value::String(s)) => FieldValue::Text(s.clone()),
            (_, Value::Number(n)) => FieldValue::Text(n.to_string()),
            (_, other) => FieldValue::Text(other.to_string()),
        }
    }

    fn to_json(&self, kind: FieldKind) -> Value {
        match self {
            FieldValue::Text(s) if kind == FieldKind::Number => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|n| {
                    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                        Some(Number::from(n as i64))
                    } else {
                        Number::from_f64(n)
                    }
                })
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(s.trim().to_string())),
            FieldValue::Text(s) => Value::String(s.trim().to_string()),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Flag(b) => Value::Bool(*b),
        }
    }
}

/// In-progress values of a create or edit form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Draft {
    values: BTreeMap<String, FieldValue>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank values for every field of a schema.
    pub fn empty(schema: &[FieldSpec]) -> Self {
        Self {
            values: schema
                .iter()
                .map(|spec| (spec.name.to_string(), FieldValue::empty(spec.kind)))
                .collect(),
        }
    }

    /// Prefill from an existing record, reading the schema's fields from the
    /// record's serialized form.
    pub fn from_record<T: Serialize>(record: &T, schema: &[FieldSpec]) -> Self {
        let json = serde_json::to_value(record).unwrap_or(Value::Null);
        let mut draft = Self::empty(schema);
        for spec in schema {
            if let Some(value) = json.get(spec.name) {
                draft.set(spec.name, FieldValue::from_json(spec.kind, value));
            }
        }
        draft
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_text).unwrap_or("")
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(name, FieldValue::Text(value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(FieldValue::is_blank)
    }

    /// JSON request body with one key per schema field present in the draft.
    pub fn to_payload(&self, schema: &[FieldSpec]) -> Value {
        let mut body = Map::new();
        for spec in schema {
            let Some(value) = self.values.get(spec.name) else {
                continue;
            };
            // Cleared optional text goes out as null, matching what the server stores.
            let json = match value {
                FieldValue::Text(_) if value.is_blank() && !spec.is_required() => Value::Null,
                _ => value.to_json(spec.kind),
            };
            body.insert(spec.name.to_string(), json);
        }
        Value::Object(body)
    }
}

/// Validate every field of a draft. Missing fields are treated as blank.
pub fn validate_draft(schema: &[FieldSpec], draft: &Draft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for spec in schema {
        let blank = FieldValue::empty(spec.kind);
        let value = draft.get(spec.name).unwrap_or(&blank);
        if let Some(message) = spec.validate(value) {
            errors.insert(spec.name, message);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: FieldSpec = FieldSpec::new(
        "name",
        "Name",
        FieldKind::Text,
        &[Rule::Required, Rule::MinLength(3), Rule::MaxLength(50)],
    );
    const EMAIL: FieldSpec =
        FieldSpec::new("email", "Email", FieldKind::Email, &[Rule::Required, Rule::Email]);
    const AMOUNT: FieldSpec = FieldSpec::new(
        "amount",
        "Amount",
        FieldKind::Number,
        &[Rule::Required, Rule::PositiveNumber],
    );
    const TAGS: FieldSpec = FieldSpec::new("permissions", "Permissions", FieldKind::List, &[
        Rule::MinItems(1),
    ]);
    const PHONE: FieldSpec = FieldSpec::new("phone", "Phone", FieldKind::Text, &[Rule::MaxLength(5)]);

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_required() {
        assert_eq!(NAME.validate(&text("  ")), Some("Name is required".to_string()));
        assert_eq!(NAME.validate(&text("Ada")), None);
    }

    #[test]
    fn test_length_bounds_count_chars() {
        assert_eq!(NAME.validate(&text("Al")), Some("Minimum 3 characters".to_string()));
        assert_eq!(NAME.validate(&text("Zoë")), None);
        assert_eq!(
            NAME.validate(&text(&"x".repeat(51))),
            Some("Maximum 50 characters".to_string())
        );
    }

    #[test]
    fn test_email_shape() {
        assert_eq!(EMAIL.validate(&text("ada@example.com")), None);
        assert_eq!(
            EMAIL.validate(&text("not-an-email")),
            Some("Wrong email format".to_string())
        );
        assert_eq!(
            EMAIL.validate(&text("a@b")),
            Some("Wrong email format".to_string())
        );
    }

    #[test]
    fn test_positive_number() {
        assert_eq!(AMOUNT.validate(&text("49.99")), None);
        assert_eq!(
            AMOUNT.validate(&text("0")),
            Some("Amount must be a positive number".to_string())
        );
        assert_eq!(
            AMOUNT.validate(&text("abc")),
            Some("Amount must be a number".to_string())
        );
    }

    #[test]
    fn test_min_items() {
        assert_eq!(
            TAGS.validate(&FieldValue::List(vec![])),
            Some("Select at least one permission".to_string())
        );
        assert_eq!(TAGS.validate(&FieldValue::List(vec!["View Users".into()])), None);
    }

    #[test]
    fn test_optional_field_skips_rules_when_blank() {
        assert_eq!(PHONE.validate(&text("")), None);
        assert!(PHONE.validate(&text("123456")).is_some());
    }

    #[test]
    fn test_validate_draft_reports_only_failing_fields() {
        let schema = [NAME, EMAIL];
        let mut draft = Draft::new();
        draft.set_text("name", "Ada Lovelace");
        draft.set_text("email", "ada-at-example");
        let errors = validate_draft(&schema, &draft);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email"), Some("Wrong email format"));
    }

    #[test]
    fn test_payload_encodes_by_kind() {
        let schema = [NAME, AMOUNT, TAGS];
        let mut draft = Draft::new();
        draft.set_text("name", " Gold ");
        draft.set_text("amount", "49");
        draft.set(
            "permissions",
            FieldValue::parse(FieldKind::List, "View Users, Edit Users").unwrap(),
        );
        assert_eq!(
            draft.to_payload(&schema),
            json!({"name": "Gold", "amount": 49, "permissions": ["View Users", "Edit Users"]})
        );
    }

    #[test]
    fn test_blank_optional_text_is_sent_as_null() {
        let schema = [NAME, PHONE];
        let mut draft = Draft::empty(&schema);
        draft.set_text("name", "Grace Hopper");
        assert_eq!(
            draft.to_payload(&schema),
            json!({"name": "Grace Hopper", "phone": null})
        );
    }

    #[test]
    fn test_from_record_reads_serialized_fields() {
        #[derive(Serialize)]
        struct Rec {
            name: String,
            amount: f64,
            permissions: Vec<String>,
        }
        let rec = Rec {
            name: "Gold".into(),
            amount: 10.5,
            permissions: vec!["A".into()],
        };
        let draft = Draft::from_record(&rec, &[NAME, AMOUNT, TAGS]);
        assert_eq!(draft.text("name"), "Gold");
        assert_eq!(draft.text("amount"), "10.5");
        assert_eq!(
            draft.get("permissions").and_then(FieldValue::as_list),
            Some(&["A".to_string()][..])
        );
    }
}
