//! Transient notices raised by list and form operations.
//!
//! The controller keeps the most recent one; the CLI prints it to stderr.

use std::fmt;
use std::time::{Duration, Instant};

use owo_colors::OwoColorize;

/// A notice produced by a list or form operation
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    /// When the toast was created
    pub timestamp: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl Toast {
    pub fn new(message: String, level: ToastLevel) -> Self {
        Self {
            message,
            level,
            timestamp: Instant::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Error)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Success)
    }

    pub fn is_error(&self) -> bool {
        self.level == ToastLevel::Error
    }

    /// Whether the toast is older than `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.timestamp.elapsed() >= ttl
    }

    /// Message prefixed and colored by level, for terminal output.
    pub fn render(&self) -> String {
        match self.level {
            ToastLevel::Info => format!("{} {}", "info:".cyan(), self.message),
            ToastLevel::Warning => format!("{} {}", "warning:".yellow(), self.message),
            ToastLevel::Error => format!("{} {}", "error:".red(), self.message),
            ToastLevel::Success => format!("{} {}", "ok:".green(), self.message),
        }
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
