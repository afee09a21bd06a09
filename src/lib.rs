#[macro_use]
mod macros;

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod entity;
pub mod error;
pub mod form;
pub mod list;
pub mod logging;
pub mod remote;
pub mod table;
pub mod toast;

pub use auth::AuthContext;
pub use config::Config;
pub use entity::{
    Entity, EntityKind, MediaPost, MessageLog, Permission, Role, Subscription, Transaction, User,
};
pub use error::{AdminError, FetchError, FieldErrors, MutationError, Result};
pub use form::{FormMode, FormPhase, FormState};
pub use list::{ListController, ListIntent, ListView, LoadOutcome, Outcome, RefreshPolicy};
pub use remote::{InMemoryRemote, InjectedFailure, RemoteCollaborator, RestClient};
pub use toast::{Toast, ToastLevel};
