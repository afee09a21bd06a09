//! Session commands: `login`, `logout`, `whoami`, `forgot-password`.

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, Session};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::{AdminError, Result};

pub const PASSWORD_ENV: &str = "KEEPCONNECT_PASSWORD";

pub async fn cmd_login(email: &str, password: Option<String>, output: OutputOptions) -> Result<()> {
    let password = password
        .or_else(|| std::env::var(PASSWORD_ENV).ok())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            AdminError::InvalidInput(format!("password required: pass --password or set {PASSWORD_ENV}"))
        })?;

    let session = Session::open()?;
    session.client().login(email.trim(), &password).await?;

    let mut config = session.config().clone();
    if let Some(token) = session.client().auth().export_token() {
        config.set_token(token);
    }
    config.save()?;

    CommandOutput::new(json!({
        "email": email.trim(),
        "logged_in": true,
        "api_url": session.client().base_url(),
    }))
    .with_text(format!("Logged in as {}", email.trim().cyan()))
    .print(output)
}

pub fn cmd_logout(output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    let had_token = config.auth.token.is_some();
    config.clear_token();
    config.save()?;

    let text = if had_token {
        "Logged out".to_string()
    } else {
        "Not logged in".dimmed().to_string()
    };
    CommandOutput::new(json!({ "logged_out": had_token }))
        .with_text(text)
        .print(output)
}

pub async fn cmd_whoami(output: OutputOptions) -> Result<()> {
    let session = Session::authenticated()?;
    let result = session.client().me().await;
    let profile = session.finish(result)?;

    let roles = profile.role_names();
    let mut text = format!("{} <{}>", profile.name.bold(), profile.email);
    if !roles.is_empty() {
        text.push_str(&format!("\nRoles: {}", roles.join(", ")));
    }

    CommandOutput::new(json!({
        "id": profile.id,
        "name": profile.name,
        "email": profile.email,
        "roles": roles,
    }))
    .with_text(text)
    .print(output)
}

pub async fn cmd_forgot_password(email: &str, output: OutputOptions) -> Result<()> {
    let session = Session::open()?;
    let sent = session.client().request_password_reset(email.trim()).await?;

    let text = if sent {
        format!("Password reset link sent to {}", email.trim().cyan())
    } else {
        format!("{}", "The server did not send a reset link".yellow())
    };
    CommandOutput::new(json!({ "email": email.trim(), "sent": sent }))
        .with_text(text)
        .print(output)
}
