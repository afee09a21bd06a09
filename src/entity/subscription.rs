use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AllRecords, Capabilities, Entity, EntityKind, flexible_bool, flexible_f64, format_amount};
use crate::form::{Draft, FieldKind, FieldSpec, Rule};
use crate::table::Column;

const SUBSCRIPTION_FORM: &[FieldSpec] = &[
    FieldSpec::new("name", "Plan name", FieldKind::Text, &[
        Rule::Required,
        Rule::MinLength(3),
        Rule::MaxLength(50),
    ]),
    FieldSpec::new("description", "Description", FieldKind::Text, &[
        Rule::Required,
        Rule::MinLength(5),
        Rule::MaxLength(200),
    ]),
    FieldSpec::new("amount", "Amount", FieldKind::Number, &[
        Rule::Required,
        Rule::PositiveNumber,
    ]),
    FieldSpec::new("tenure", "Tenure", FieldKind::Text, &[Rule::Required]),
];

/// A subscription plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(alias = "subscription_id")]
    pub id: u64,
    #[serde(alias = "planName", alias = "plan_name")]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub amount: f64,
    #[serde(default)]
    pub tenure: Option<String>,
    #[serde(default, alias = "users_count", alias = "userCount")]
    pub user_count: u64,
    #[serde(default, alias = "isActive", alias = "status", deserialize_with = "flexible_bool")]
    pub is_active: bool,
}

/// URL slug for a plan name: lowercased, whitespace runs replaced by `-`.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

impl Entity for Subscription {
    type Id = u64;
    type Facet = AllRecords;

    const KIND: EntityKind = EntityKind::Subscriptions;
    const CAPABILITIES: Capabilities = Capabilities::CRUD_TOGGLE;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::from(self.name.as_str()), Cow::from(self.slug.as_str())]
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("ID", |s: &Subscription| s.id.to_string()).right(),
            Column::new("Plan", |s: &Subscription| s.name.clone()),
            Column::new("Slug", |s: &Subscription| s.slug.clone()),
            Column::new("Amount", |s: &Subscription| format_amount(s.amount)).right(),
            Column::new("Tenure", |s: &Subscription| {
                s.tenure.clone().unwrap_or_else(|| "-".to_string())
            }),
            Column::new("Users", |s: &Subscription| s.user_count.to_string()).right(),
            Column::new("Status", |s: &Subscription| {
                if s.is_active { "Active" } else { "Inactive" }.to_string()
            })
            .center(),
        ]
    }

    fn form_schema() -> &'static [FieldSpec] {
        SUBSCRIPTION_FORM
    }

    fn payload(draft: &Draft) -> Value {
        let mut body = draft.to_payload(SUBSCRIPTION_FORM);
        if let Value::Object(map) = &mut body
            && let Some(Value::String(name)) = map.get("name")
        {
            let slug = slugify(name);
            map.insert("slug".to_string(), Value::String(slug));
        }
        body
    }

    fn toggled(&self) -> Option<Self> {
        Some(Subscription {
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
    fn test_slugify() {
        assert_eq!(slugify("Startup Plan"), "startup-plan");
        assert_eq!(slugify("  Gold   Annual\tPlan "), "gold-annual-plan");
    }

    #[test]
    fn test_payload_derives_slug() {
        let mut draft = Draft::new();
        draft.set_text("name", "Enterprise Plan");
        draft.set_text("description", "For large teams");
        draft.set_text("amount", "199");
        draft.set_text("tenure", "yearly");
        let body = Subscription::payload(&draft);
        assert_eq!(body["slug"], json!("enterprise-plan"));
        assert_eq!(body["amount"], json!(199));
    }

    #[test]
    fn test_decode_camel_case_fixture() {
        let plan: Subscription = serde_json::from_value(json!({
            "subscription_id": 1,
            "planName": "Startup Plan",
            "slug": "startup-plan",
            "amount": "49.00",
            "user_count": 15,
            "isActive": true
        }))
        .unwrap();
        assert_eq!(plan.id, 1);
        assert_eq!(plan.amount, 49.0);
        assert!(plan.is_active);
    }
}
