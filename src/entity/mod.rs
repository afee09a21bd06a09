//! Record types managed by the dashboard and the trait that ties them into
//! the generic list/table/form machinery.

mod media_post;
mod message_log;
mod permission;
mod role;
mod subscription;
mod transaction;
mod user;

use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdminError, Result};
use crate::form::{Draft, FieldSpec};
use crate::table::Column;

pub use media_post::{CollectionTab, MediaCollection, MediaPost};
pub(crate) use media_post::mime_for_path;
pub use message_log::{LogUser, Medium, MediumTab, MessageLog};
pub use permission::Permission;
pub use role::{Role, known_permissions};
pub use subscription::{Subscription, slugify};
pub use transaction::{Transaction, TransactionStatus, TransactionTab};
pub use user::User;

/// The collections exposed by the dashboard API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum EntityKind {
    #[value(alias = "user")]
    Users,
    #[value(alias = "role")]
    Roles,
    #[value(alias = "permission")]
    Permissions,
    #[value(alias = "subscription", alias = "plans")]
    Subscriptions,
    #[value(alias = "transaction")]
    Transactions,
    #[value(name = "logs", alias = "message-logs")]
    MessageLogs,
    #[value(name = "media", alias = "posts", alias = "daily-posts")]
    MediaPosts,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Users,
        EntityKind::Roles,
        EntityKind::Permissions,
        EntityKind::Subscriptions,
        EntityKind::Transactions,
        EntityKind::MessageLogs,
        EntityKind::MediaPosts,
    ];

    /// Path segment of the collection under `/api`.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Roles => "roles",
            EntityKind::Permissions => "permissions",
            EntityKind::Subscriptions => "subscriptions",
            EntityKind::Transactions => "transactions",
            EntityKind::MessageLogs => "text-logs",
            EntityKind::MediaPosts => "media",
        }
    }

    /// Path used for `GET` of the whole collection.
    pub fn list_path(self) -> &'static str {
        match self {
            EntityKind::MessageLogs => "text-logs/messages",
            other => other.collection(),
        }
    }

    /// Human label in the plural, e.g. "message logs".
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Roles => "roles",
            EntityKind::Permissions => "permissions",
            EntityKind::Subscriptions => "subscriptions",
            EntityKind::Transactions => "transactions",
            EntityKind::MessageLogs => "message logs",
            EntityKind::MediaPosts => "media posts",
        }
    }

    /// Human label in the singular, e.g. "message log".
    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Users => "user",
            EntityKind::Roles => "role",
            EntityKind::Permissions => "permission",
            EntityKind::Subscriptions => "subscription",
            EntityKind::Transactions => "transaction",
            EntityKind::MessageLogs => "message log",
            EntityKind::MediaPosts => "media post",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Remote operations a collection supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub toggle: bool,
    pub upload: bool,
}

impl Capabilities {
    pub const CRUD: Capabilities = Capabilities {
        create: true,
        update: true,
        delete: true,
        toggle: false,
        upload: false,
    };

    pub const CRUD_TOGGLE: Capabilities = Capabilities {
        toggle: true,
        ..Capabilities::CRUD
    };

    pub const NONE: Capabilities = Capabilities {
        create: false,
        update: false,
        delete: false,
        toggle: false,
        upload: false,
    };
}

/// Extra, non-search filter applied before the search term (the tabs of a
/// list page).
pub trait Facet<E>:
    Default + Clone + PartialEq + fmt::Debug + fmt::Display + FromStr<Err = AdminError> + Send + Sync
{
    fn admits(&self, record: &E) -> bool;
}

/// Facet for lists without tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllRecords;

impl fmt::Display for AllRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all")
    }
}

impl FromStr for AllRecords {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(AllRecords),
            _ => Err(AdminError::InvalidInput(format!(
                "unknown tab '{s}', this list has no tabs"
            ))),
        }
    }
}

impl<E> Facet<E> for AllRecords {
    fn admits(&self, _record: &E) -> bool {
        true
    }
}

/// A record in one of the dashboard collections.
///
/// Implementors describe their identity, the fields free-text search looks
/// at, how they render as table rows and how their edit form is laid out.
/// Everything else (fetching, filtering, paging, mutating) is generic.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Clone
        + Eq
        + Hash
        + fmt::Debug
        + fmt::Display
        + FromStr<Err: fmt::Display>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    type Facet: Facet<Self>;

    const KIND: EntityKind;
    const CAPABILITIES: Capabilities;

    fn id(&self) -> &Self::Id;

    /// Values matched (case-insensitively, as substrings) by the search box.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    fn columns() -> Vec<Column<Self>>;

    /// Fields of the create/edit form. Empty for collections without a form.
    fn form_schema() -> &'static [FieldSpec] {
        &[]
    }

    fn to_draft(&self) -> Draft {
        Draft::from_record(self, Self::form_schema())
    }

    /// Request body for a create or update built from a form draft.
    fn payload(draft: &Draft) -> Value {
        draft.to_payload(Self::form_schema())
    }

    /// The record with its status flag flipped, for collections that have one.
    fn toggled(&self) -> Option<Self> {
        None
    }

    fn decode_list(body: Value) -> Result<Vec<Self>> {
        decode_collection(body)
    }

    fn decode_record(body: Value) -> Result<Self> {
        decode_single(body)
    }

    fn parse_id(raw: &str) -> Result<Self::Id> {
        raw.trim().parse::<Self::Id>().map_err(|e| {
            AdminError::InvalidInput(format!(
                "invalid {} id '{}': {}",
                Self::KIND.singular(),
                raw,
                e
            ))
        })
    }
}

/// Decode a list response: a bare array or a `{"data": [...]}` envelope.
pub fn decode_collection<E: DeserializeOwned>(body: Value) -> Result<Vec<E>> {
    match body {
        Value::Array(_) => Ok(serde_json::from_value(body)?),
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Array(_)) => Ok(serde_json::from_value(data)?),
            Some(Value::Object(mut inner)) => match inner.remove("data") {
                Some(data @ Value::Array(_)) => Ok(serde_json::from_value(data)?),
                _ => Err(unexpected_shape("list")),
            },
            _ => Err(unexpected_shape("list")),
        },
        _ => Err(unexpected_shape("list")),
    }
}

/// Decode a single-record response: bare or wrapped in `{"data": {...}}`.
pub fn decode_single<E: DeserializeOwned>(body: Value) -> Result<E> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Object(_)) => Ok(serde_json::from_value(data)?),
            Some(other) => {
                map.insert("data".to_string(), other);
                Ok(serde_json::from_value(Value::Object(map))?)
            }
            None => Ok(serde_json::from_value(Value::Object(map))?),
        },
        _ => Err(unexpected_shape("record")),
    }
}

fn unexpected_shape(what: &str) -> AdminError {
    AdminError::InvalidInput(format!("unexpected {what} response shape"))
}

/// Accept `true`/`false`, `0`/`1` and `"0"`/`"1"`/`"true"`/`"false"`.
pub(crate) fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "active" => Ok(true),
            "0" | "false" | "no" | "inactive" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid boolean '{other}'"))),
        },
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("invalid boolean {other}"))),
    }
}

/// Accept JSON numbers and numeric strings (decimal columns arrive as strings).
pub(crate) fn flexible_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid number '{s}'"))),
        Value::Null => Ok(0.0),
        other => Err(de::Error::custom(format!("invalid number {other}"))),
    }
}

/// Format an amount the way the dashboard shows it: no trailing `.00`.
pub(crate) fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}
