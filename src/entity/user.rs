use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{AllRecords, Capabilities, Entity, EntityKind, flexible_bool};
use crate::form::{FieldKind, FieldSpec, Rule};
use crate::table::Column;

const USER_FORM: &[FieldSpec] = &[
    FieldSpec::new("name", "Name", FieldKind::Text, &[
        Rule::Required,
        Rule::MinLength(3),
        Rule::MaxLength(50),
    ]),
    FieldSpec::new("email", "Email", FieldKind::Email, &[
        Rule::Required,
        Rule::Email,
    ]),
    FieldSpec::new("position", "Business name", FieldKind::Text, &[
        Rule::MaxLength(100),
    ]),
    FieldSpec::new("phone", "Phone", FieldKind::Text, &[Rule::MaxLength(20)]),
];

/// A dashboard user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default, alias = "business_name", alias = "businessName")]
    pub position: Option<String>,
    #[serde(default, alias = "phone_number", alias = "phoneNumber")]
    pub phone: Option<String>,
    #[serde(
        default = "default_active",
        alias = "isActive",
        alias = "status",
        deserialize_with = "flexible_bool"
    )]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn status_label(&self) -> &'static str {
        if self.is_active { "Active" } else { "Inactive" }
    }
}

impl Entity for User {
    type Id = u64;
    type Facet = AllRecords;

    const KIND: EntityKind = EntityKind::Users;
    const CAPABILITIES: Capabilities = Capabilities::CRUD_TOGGLE;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::from(self.name.as_str()), Cow::from(self.email.as_str())];
        fields.extend(self.position.as_deref().map(Cow::from));
        fields.extend(self.phone.as_deref().map(Cow::from));
        fields
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("ID", |u: &User| u.id.to_string()).right(),
            Column::new("Name", |u: &User| u.name.clone()),
            Column::new("Email", |u: &User| u.email.clone()),
            Column::new("Business Name", |u: &User| {
                u.position.clone().unwrap_or_else(|| "-".to_string())
            }),
            Column::new("Phone", |u: &User| u.phone.clone().unwrap_or_else(|| "-".to_string())),
            Column::new("Status", |u: &User| u.status_label().to_string()).center(),
        ]
    }

    fn form_schema() -> &'static [FieldSpec] {
        USER_FORM
    }

    fn toggled(&self) -> Option<Self> {
        Some(User {
            is_active: !self.is_active,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_laravel_user() {
        let user: User = serde_json::from_value(json!({
            "id": 3,
            "name": "Ada",
            "email": "ada@example.com",
            "business_name": "Analytical Engines",
            "phone": null,
            "is_active": 0
        }))
        .unwrap();
        assert_eq!(user.position.as_deref(), Some("Analytical Engines"));
        assert_eq!(user.phone, None);
        assert!(!user.is_active);
    }

    #[test]
    fn test_missing_status_defaults_to_active() {
        let user: User =
            serde_json::from_value(json!({"id": 1, "name": "Ada", "email": "a@b.io"})).unwrap();
        assert!(user.is_active);
    }

    #[test]
    fn test_toggled_flips_only_status() {
        let user: User =
            serde_json::from_value(json!({"id": 1, "name": "Ada", "email": "a@b.io"})).unwrap();
        let flipped = user.toggled().unwrap();
        assert!(!flipped.is_active);
        assert_eq!(flipped.name, user.name);
    }

    #[test]
    fn test_draft_prefills_form_fields() {
        let user: User = serde_json::from_value(
            json!({"id": 1, "name": "Ada", "email": "a@b.io", "phone": "555"}),
        )
        .unwrap();
        let draft = user.to_draft();
        assert_eq!(draft.text("name"), "Ada");
        assert_eq!(draft.text("phone"), "555");
        assert_eq!(draft.text("position"), "");
    }
}
