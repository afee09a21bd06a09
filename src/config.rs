//! Client configuration.
//!
//! Stored as `config.yaml` in `$KEEPCONNECT_CONFIG_DIR`, or the platform
//! config directory when that is unset. Holds the API location, paging and
//! timeout defaults, and the bearer token saved by `login`.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AdminError, Result};

pub const CONFIG_DIR_ENV: &str = "KEEPCONNECT_CONFIG_DIR";
pub const API_URL_ENV: &str = "KEEPCONNECT_API_URL";
pub const TOKEN_ENV: &str = "KEEPCONNECT_TOKEN";

/// Keys accepted by `config set`.
pub const CONFIG_KEYS: &[&str] = &["api_url", "page_size", "timeout_secs", "auth.token"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend origin; `/api` is appended when missing
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Rows per page (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Total request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "AuthConfig::is_empty")]
    pub auth: AuthConfig,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_page_size() -> usize {
    crate::list::DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Directory holding `config.yaml`.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = non_empty_env(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    directories::ProjectDirs::from("com", "keepconnect", "kcadmin")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            AdminError::Config(format!(
                "cannot determine a config directory; set {CONFIG_DIR_ENV}"
            ))
        })
}

fn with_path(path: &Path, action: &str, e: std::io::Error) -> AdminError {
    AdminError::Io(std::io::Error::new(
        e.kind(),
        format!("Failed to {action} config at {}: {e}", path.display()),
    ))
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.yaml"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|e| with_path(path, "read", e))?;
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| with_path(parent, "create directory for", e))?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).map_err(|e| with_path(path, "write", e))?;

        // The file may hold a bearer token: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, permissions)
                .map_err(|e| with_path(path, "set permissions on", e))?;
        }

        Ok(())
    }

    /// API URL, with `KEEPCONNECT_API_URL` taking precedence.
    pub fn api_url(&self) -> String {
        non_empty_env(API_URL_ENV).unwrap_or_else(|| self.api_url.clone())
    }

    /// Bearer token, with `KEEPCONNECT_TOKEN` taking precedence.
    pub fn token(&self) -> Option<String> {
        non_empty_env(TOKEN_ENV).or_else(|| self.auth.token.clone())
    }

    /// Whether the token in use is the one stored in the file.
    pub fn token_is_stored(&self) -> bool {
        self.auth.token.is_some() && non_empty_env(TOKEN_ENV).is_none()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.auth.token = (!token.trim().is_empty()).then_some(token);
    }

    pub fn clear_token(&mut self) {
        self.auth.token = None;
    }

    /// Set one key from its string form, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api_url" => {
                validate_api_url(value)?;
                self.api_url = value.trim_end_matches('/').to_string();
            }
            "page_size" => {
                self.page_size = parse_positive(key, value)? as usize;
            }
            "timeout_secs" => {
                self.timeout_secs = parse_positive(key, value)?;
            }
            "auth.token" => self.set_token(value),
            _ => {
                return Err(AdminError::Config(format!(
                    "unknown config key '{key}', expected one of: {}",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn validate_api_url(value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| AdminError::Config(format!("invalid api_url '{value}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AdminError::Config(format!(
            "invalid api_url '{value}': scheme must be http or https, got '{scheme}'"
        ))),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AdminError::Config(format!(
            "{key} must be a positive integer, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.timeout_secs, 60);
        assert!(config.auth.token.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml_ng::from_str("page_size: 25\n").unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();
        config.set("api_url", "https://admin.example.com/").unwrap();
        assert_eq!(config.api_url, "https://admin.example.com");

        assert!(matches!(config.set("api_url", "ftp://x"), Err(AdminError::Config(_))));
        assert!(matches!(config.set("page_size", "0"), Err(AdminError::Config(_))));
        assert!(matches!(config.set("page_size", "ten"), Err(AdminError::Config(_))));
        assert!(matches!(config.set("colour", "red"), Err(AdminError::Config(_))));

        config.set("page_size", "25").unwrap();
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn test_blank_token_clears() {
        let mut config = Config::default();
        config.set("auth.token", "abc123").unwrap();
        assert_eq!(config.auth.token.as_deref(), Some("abc123"));
        config.set_token("  ");
        assert!(config.auth.token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.set_token("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.set("page_size", "5").unwrap();
        config.set_token("tok");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.page_size, 5);
        assert_eq!(loaded.auth.token.as_deref(), Some("tok"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.page_size, 10);
    }
}
