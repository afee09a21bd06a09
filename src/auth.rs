//! Bearer-token session shared by every request of a client.
//!
//! The token lives in a [`SecretBox`] and only leaves it as a
//! [`RedactedHeader`], which formats as `[REDACTED]` in logs and debug output.

use std::fmt;

use parking_lot::RwLock;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretBox};

use crate::error::{AdminError, Result};

/// Authorization header value that never prints its contents.
pub struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn new(value: String) -> Self {
        Self { value }
    }

    pub fn as_header_value(&self) -> Result<HeaderValue> {
        let mut header = HeaderValue::from_str(&self.value)
            .map_err(|_| AdminError::Auth("token contains invalid header characters".to_string()))?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Scoped authentication state: set on login, cleared on logout or when the
/// server reports the token as expired.
#[derive(Default)]
pub struct AuthContext {
    token: RwLock<Option<SecretBox<String>>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let ctx = Self::new();
        ctx.set_token(token);
        ctx
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut slot = self.token.write();
        *slot = if token.trim().is_empty() {
            None
        } else {
            Some(SecretBox::new(Box::new(token)))
        };
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// `Bearer <token>` header, or `None` when logged out.
    pub fn bearer(&self) -> Option<RedactedHeader> {
        self.token
            .read()
            .as_ref()
            .map(|t| RedactedHeader::new(format!("Bearer {}", t.expose_secret())))
    }

    /// The raw token, for persisting to the config file.
    pub fn export_token(&self) -> Option<String> {
        self.token.read().as_ref().map(|t| t.expose_secret().clone())
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
