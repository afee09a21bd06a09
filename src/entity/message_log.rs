use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{Capabilities, Entity, EntityKind, Facet};
use crate::table::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    #[serde(alias = "SMS", alias = "Sms")]
    Sms,
    #[serde(alias = "WHATSAPP", alias = "WhatsApp", alias = "Whatsapp")]
    Whatsapp,
}

crate::enum_display_fromstr!(Medium, "medium", {
    Sms => "sms",
    Whatsapp => "whatsapp",
});

/// Medium tab of the message log list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediumTab {
    #[default]
    All,
    Sms,
    Whatsapp,
}

crate::enum_display_fromstr!(MediumTab, "medium tab", {
    All => "all",
    Sms => "sms",
    Whatsapp => "whatsapp",
});

impl Facet<MessageLog> for MediumTab {
    fn admits(&self, record: &MessageLog) -> bool {
        match self {
            MediumTab::All => true,
            MediumTab::Sms => record.medium == Medium::Sms,
            MediumTab::Whatsapp => record.medium == Medium::Whatsapp,
        }
    }
}

/// Sender account attached to a log entry, when the backend includes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogUser {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// One SMS or WhatsApp message sent through the platform. Read-only apart
/// from deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLog {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub from_phone: String,
    #[serde(default)]
    pub to_phone: String,
    #[serde(default)]
    pub message: String,
    pub medium: Medium,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<LogUser>,
}

impl Entity for MessageLog {
    type Id = u64;
    type Facet = MediumTab;

    const KIND: EntityKind = EntityKind::MessageLogs;
    const CAPABILITIES: Capabilities = Capabilities {
        delete: true,
        ..Capabilities::NONE
    };

    fn id(&self) -> &u64 {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::from(self.message.as_str()),
            Cow::from(self.from_phone.as_str()),
            Cow::from(self.to_phone.as_str()),
            Cow::from(self.medium.to_string()),
        ]
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("ID", |l: &MessageLog| l.id.to_string()).right(),
            Column::new("User", |l: &MessageLog| {
                l.user
                    .as_ref()
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| "-".to_string())
            }),
            Column::new("From", |l: &MessageLog| l.from_phone.clone()),
            Column::new("To", |l: &MessageLog| l.to_phone.clone()),
            Column::new("Message", |l: &MessageLog| preview(&l.message, 40)),
            Column::new("Medium", |l: &MessageLog| l.medium.to_string().to_uppercase()).center(),
            Column::new("Sent", |l: &MessageLog| {
                l.created_at
                    .as_deref()
                    .map(|t| t.chars().take(16).collect::<String>().replace('T', " "))
                    .unwrap_or_else(|| "-".to_string())
            }),
        ]
    }
}

fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
