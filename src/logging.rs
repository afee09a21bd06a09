//! Diagnostic logging for the `kcadmin` binary.
//!
//! Events go to stderr so stdout stays clean for tables and `--json`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{AdminError, Result};

pub const LOG_ENV: &str = "KEEPCONNECT_LOG";

// Transport crates log request headers at debug and below.
const NOISY: &[(&str, &str)] = &[("hyper", "warn"), ("hyper_util", "warn"), ("reqwest", "warn"), ("h2", "warn")];

/// Base level for a `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter. `KEEPCONNECT_LOG` replaces the base level but the
/// transport overrides always apply.
pub fn build_env_filter(verbosity: u8, from_env: Option<&str>) -> Result<EnvFilter> {
    let base = from_env
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| level_for(verbosity));

    let mut directives = vec![base.to_string()];
    directives.extend(NOISY.iter().map(|(target, level)| format!("{target}={level}")));

    let filter = directives.join(",");
    EnvFilter::try_new(&filter)
        .map_err(|e| AdminError::Config(format!("invalid log filter '{filter}': {e}")))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let from_env = std::env::var(LOG_ENV).ok();
    let filter = build_env_filter(verbosity, from_env.as_deref())?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
    Ok(())
}
