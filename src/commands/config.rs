//! `config show` and `config set`.

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{API_URL_ENV, Config, TOKEN_ENV};
use crate::error::Result;

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 8 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let path = Config::config_path()?;
    let token = config.token();
    let api_url = config.api_url();
    let api_url_from_env = api_url != config.api_url;

    let json_output = json!({
        "api_url": api_url,
        "page_size": config.page_size,
        "timeout_secs": config.timeout_secs,
        "auth": {
            "token": token.as_deref().map(mask_sensitive_value),
            "logged_in": token.is_some(),
        },
        "config_file": path.to_string_lossy(),
    });

    let mut text = format!("{}\n\n", "Configuration:".cyan().bold());
    text.push_str(&format!("{}: {}", "api_url".cyan(), api_url));
    if api_url_from_env {
        text.push_str(&format!(" {}", format!("(from {API_URL_ENV})").dimmed()));
    }
    text.push('\n');
    text.push_str(&format!("{}: {}\n", "page_size".cyan(), config.page_size));
    text.push_str(&format!("{}: {}\n", "timeout_secs".cyan(), config.timeout_secs));

    let token_status = match &token {
        Some(token) if config.auth.token.as_deref() != Some(token.as_str()) => {
            format!("{} {}", mask_sensitive_value(token), format!("(from {TOKEN_ENV})").dimmed())
        }
        Some(token) => mask_sensitive_value(token),
        None => "not logged in".dimmed().to_string(),
    };
    text.push_str(&format!("{}: {}\n\n", "auth.token".cyan(), token_status));
    text.push_str(&format!("{}", format!("Config file: {}", path.display()).dimmed()));

    CommandOutput::new(json_output).with_text(text).print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    let shown = if key == "auth.token" {
        mask_sensitive_value(value.trim())
    } else {
        value.trim().to_string()
    };
    CommandOutput::new(json!({
        "action": "config_set",
        "key": key,
        "value": shown,
        "success": true,
    }))
    .with_text(format!("Set {} to {}", key.cyan(), shown))
    .print(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_token() {
        assert_eq!(mask_sensitive_value("1|abcdefghijkl"), "1|...kl");
    }

    #[test]
    fn test_mask_short_token_fully() {
        assert_eq!(mask_sensitive_value("abcdefgh"), "****");
        assert_eq!(mask_sensitive_value(""), "****");
    }

    #[test]
    fn test_mask_counts_characters_not_bytes() {
        assert_eq!(mask_sensitive_value("日本語中文日本語中"), "日本...語中");
    }
}
