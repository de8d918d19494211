/// Tracing initialization for binaries built on this crate.
///
/// The library only emits events; installing a subscriber is the binary's call.
use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::ColorWhen;

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "warn";

/// Install a global fmt subscriber writing to stderr.
///
/// - Respects `RUST_LOG` via `EnvFilter`, defaulting to `warn`.
/// - ANSI color controlled by `ColorWhen`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(color: ColorWhen) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(color.should_color_stderr())
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
