use std::borrow::Cow;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AllRecords, Capabilities, Entity, EntityKind};
use crate::form::{FieldKind, FieldSpec, Rule};
use crate::table::Column;

const ROLE_FORM: &[FieldSpec] = &[
    FieldSpec::new("name", "Role name", FieldKind::Text, &[
        Rule::Required,
        Rule::MinLength(3),
        Rule::MaxLength(50),
    ]),
    FieldSpec::new("permissions", "Permissions", FieldKind::List, &[
        Rule::MinItems(1),
    ]),
];

/// Permission names offered by the role form when the server does not
/// provide its own list.
pub fn known_permissions() -> &'static [&'static str] {
    &[
        "View Users",
        "Create Users",
        "Edit Users",
        "Delete Users",
        "View Roles",
        "Edit Roles",
        "Manage Permissions",
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    #[serde(alias = "roleName", alias = "role")]
    pub name: String,
    #[serde(default, deserialize_with = "permission_names")]
    pub permissions: Vec<String>,
}

/// Permissions arrive either as plain names or as `{id, name}` objects.
fn permission_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect())
}

impl Entity for Role {
    type Id = u64;
    type Facet = AllRecords;

    const KIND: EntityKind = EntityKind::Roles;
    const CAPABILITIES: Capabilities = Capabilities::CRUD;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::from(self.name.as_str())];
        fields.extend(self.permissions.iter().map(|p| Cow::from(p.as_str())));
        fields
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("ID", |r: &Role| r.id.to_string()).right(),
            Column::new("Role", |r: &Role| r.name.clone()),
            Column::new("Permissions", |r: &Role| {
                if r.permissions.is_empty() {
                    "-".to_string()
                } else {
                    r.permissions.join(", ")
                }
            }),
        ]
    }

    fn form_schema() -> &'static [FieldSpec] {
        ROLE_FORM
    }
}
