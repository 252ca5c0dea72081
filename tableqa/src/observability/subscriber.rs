//! Global `tracing` subscriber setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "tableqa=info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Builds the filter: `RUST_LOG` if set and valid, else `fallback`.
#[must_use]
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs a global subscriber.
///
/// Returns false if one was already installed; the existing subscriber is
/// left in place, so calling this more than once is harmless.
pub fn init_tracing(format: TracingFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(true);

    let installed = match format {
        TracingFormat::Pretty => builder.try_init().is_ok(),
        TracingFormat::Json => builder.json().try_init().is_ok(),
    };

    if !installed {
        tracing::debug!("Global tracing subscriber already initialized");
    }
    installed
}
