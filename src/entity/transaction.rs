use std::borrow::Cow;
use std::fmt;

use jiff::civil::Date;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::{Capabilities, Entity, EntityKind, Facet, flexible_f64, format_amount};
use crate::table::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[serde(alias = "credited", alias = "CREDITED")]
    Credited,
    #[serde(alias = "debited", alias = "DEBITED")]
    Debited,
}

impl TransactionStatus {
    pub fn flipped(self) -> Self {
        match self {
            TransactionStatus::Credited => TransactionStatus::Debited,
            TransactionStatus::Debited => TransactionStatus::Credited,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Credited => write!(f, "Credited"),
            TransactionStatus::Debited => write!(f, "Debited"),
        }
    }
}

/// Status tab of the transactions list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionTab {
    #[default]
    All,
    Credited,
    Debited,
}

crate::enum_display_fromstr!(TransactionTab, "transaction tab", {
    All => "all",
    Credited => "credited",
    Debited => "debited",
});

impl Facet<Transaction> for TransactionTab {
    fn admits(&self, record: &Transaction) -> bool {
        match self {
            TransactionTab::All => true,
            TransactionTab::Credited => record.status == TransactionStatus::Credited,
            TransactionTab::Debited => record.status == TransactionStatus::Debited,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    #[serde(default, alias = "transactionName", alias = "transaction_name", alias = "title")]
    pub name: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<u64>,
    #[serde(alias = "created_at", deserialize_with = "civil_date")]
    pub date: Date,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub amount: f64,
    pub status: TransactionStatus,
}

/// Dates arrive either as `2025-09-12` or as a full timestamp; only the
/// calendar date is kept.
fn civil_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.get(..10).unwrap_or(&raw);
    day.parse::<Date>()
        .map_err(|e| de::Error::custom(format!("invalid date '{raw}': {e}")))
}

impl Entity for Transaction {
    type Id = u64;
    type Facet = TransactionTab;

    const KIND: EntityKind = EntityKind::Transactions;
    const CAPABILITIES: Capabilities = Capabilities {
        toggle: true,
        ..Capabilities::NONE
    };

    fn id(&self) -> &u64 {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::from(self.id.to_string()), Cow::from(self.name.as_str())]
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Transaction ID", |t: &Transaction| t.id.to_string()).right(),
            Column::new("Name", |t: &Transaction| t.name.clone()),
            Column::new("User ID", |t: &Transaction| {
                t.user_id.map(|u| u.to_string()).unwrap_or_else(|| "-".to_string())
            })
            .right(),
            Column::new("Date", |t: &Transaction| t.date.to_string()),
            Column::new("Amount", |t: &Transaction| format_amount(t.amount)).right(),
            Column::new("Status", |t: &Transaction| t.status.to_string()).center(),
        ]
    }

    fn toggled(&self) -> Option<Self> {
        Some(Transaction {
            status: self.status.flipped(),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Transaction {
        serde_json::from_value(json!({
            "id": 1,
            "transactionName": "Invoice #1001",
            "user_id": 101,
            "date": "2025-09-12",
            "amount": 250,
            "status": "Credited"
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_fixture() {
        let tx = sample();
        assert_eq!(tx.name, "Invoice #1001");
        assert_eq!(tx.date, jiff::civil::date(2025, 9, 12));
        assert_eq!(tx.status, TransactionStatus::Credited);
    }

    #[test]
    fn test_timestamp_date_is_truncated() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 2,
            "created_at": "2025-10-01T08:30:00.000000Z",
            "status": "debited"
        }))
        .unwrap();
        assert_eq!(tx.date, jiff::civil::date(2025, 10, 1));
        assert_eq!(tx.status, TransactionStatus::Debited);
    }

    #[test]
    fn test_toggle_flips_status() {
        assert_eq!(
            sample().toggled().map(|t| t.status),
            Some(TransactionStatus::Debited)
        );
    }

    #[test]
    fn test_status_tab() {
        let tx = sample();
        assert!(TransactionTab::Credited.admits(&tx));
        assert!(!TransactionTab::Debited.admits(&tx));
        assert!("DEBITED".parse::<TransactionTab>().is_ok());
    }
}
