mod auth;
mod config;
mod list;
mod record;
mod upload;

pub use auth::{cmd_forgot_password, cmd_login, cmd_logout, cmd_whoami};
pub use config::{cmd_config_set, cmd_config_show};
pub use list::{ListOptions, cmd_list};
pub use record::{cmd_create, cmd_delete, cmd_show, cmd_toggle, cmd_update};
pub use upload::cmd_upload;

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::warn;

use crate::auth::AuthContext;
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::entity::Entity;
use crate::error::{AdminError, FieldErrors, Result};
use crate::list::ListController;
use crate::remote::RestClient;
use crate::toast::Toast;

/// A command result with a JSON form and an optional text form.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print as JSON when requested, else the text form (falling back to
    /// pretty JSON).
    pub fn print(self, output: OutputOptions) -> Result<()> {
        match (output.json, self.text) {
            (false, Some(text)) => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Config plus an HTTP client carrying the stored token.
pub(crate) struct Session {
    config: Config,
    client: Arc<RestClient>,
}

impl Session {
    pub fn open() -> Result<Self> {
        let config = Config::load()?;
        let auth = Arc::new(AuthContext::new());
        if let Some(token) = config.token() {
            auth.set_token(token);
        }
        let client = Arc::new(RestClient::from_config(&config, auth)?);
        Ok(Self { config, client })
    }

    /// Open a session that must already hold a token.
    pub fn authenticated() -> Result<Self> {
        let session = Self::open()?;
        if !session.client.auth().is_authenticated() {
            return Err(AdminError::Auth(
                "not logged in; run `kcadmin login --email <email>`".to_string(),
            ));
        }
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &Arc<RestClient> {
        &self.client
    }

    pub fn controller<E: Entity>(&self) -> ListController<E, RestClient> {
        ListController::new(Arc::clone(&self.client)).with_page_size(self.config.page_size)
    }

    /// Persist token changes made while running: a 401 clears the token in
    /// memory, and the stored copy goes with it unless the token came from
    /// the environment.
    pub fn finish<T>(self, result: Result<T>) -> Result<T> {
        if self.config.token_is_stored() && !self.client.auth().is_authenticated() {
            warn!("stored token was rejected; removing it");
            let mut config = self.config;
            config.clear_token();
            config.save()?;
        }
        result
    }
}

/// Print a controller notice on stderr so stdout stays parseable.
pub(crate) fn emit_notice(notice: Option<Toast>, output: OutputOptions) {
    if let Some(toast) = notice
        && !output.json
    {
        eprintln!("{}", toast.render());
    }
}

/// Print each field error, one per line.
pub(crate) fn print_field_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {}: {}", field.cyan(), message.red());
    }
}

/// Two-column field/value table for a single record.
pub(crate) fn render_record<E: Entity>(record: &E) -> String {
    let mut builder = Builder::default();
    for column in E::columns() {
        builder.push_record([column.header.bold().to_string(), column.cell(record)]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub(crate) fn record_json<E: Entity>(record: &E) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::User;
    use serde_json::json;

    #[test]
    fn test_render_record_lists_every_column() {
        let user: User = serde_json::from_value(json!({
            "id": 7, "name": "Ada", "email": "ada@example.com", "phone": "555-0100"
        }))
        .unwrap();
        let rendered = render_record(&user);
        assert!(rendered.contains("Ada"));
        assert!(rendered.contains("ada@example.com"));
        assert!(rendered.contains("555-0100"));
        assert!(rendered.contains("Email"));
    }
}
