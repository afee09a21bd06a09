use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{AllRecords, Capabilities, Entity, EntityKind};
use crate::form::{FieldKind, FieldSpec, Rule};
use crate::table::Column;

const PERMISSION_FORM: &[FieldSpec] = &[FieldSpec::new(
    "name",
    "Permission name",
    FieldKind::Text,
    &[Rule::Required, Rule::MaxLength(100)],
)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: u64,
    #[serde(alias = "permissionName", alias = "permission")]
    pub name: String,
}

impl Entity for Permission {
    type Id = u64;
    type Facet = AllRecords;

    const KIND: EntityKind = EntityKind::Permissions;
    const CAPABILITIES: Capabilities = Capabilities::CRUD;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::from(self.name.as_str())]
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("ID", |p: &Permission| p.id.to_string()).right(),
            Column::new("Permission", |p: &Permission| p.name.clone()),
        ]
    }

    fn form_schema() -> &'static [FieldSpec] {
        PERMISSION_FORM
    }
}
