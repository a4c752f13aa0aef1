//! Tracing subscriber initialization.
//!
//! The dashboard owns the terminal, so log records go to a file and only
//! when one is configured.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `RABBIT_TOP_LOG` env var (per-target directives, e.g. `rabbit_top=debug,warn`)
//! 2. `RUST_LOG` env var
//! 3. `--log-level` CLI flag
//! 4. Default level: `info`

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Project-specific filter variable.
pub const LOG_ENV: &str = "RABBIT_TOP_LOG";

pub const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber writing to `log_file`, appending.
///
/// Returns `Ok(false)` without installing anything when no file is given.
pub fn init(log_file: Option<&Path>, level: Option<&str>) -> Result<bool> {
    let Some(path) = log_file else {
        return Ok(false);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))?;

    Ok(true)
}

/// Build an `EnvFilter` respecting the priority chain:
/// `RABBIT_TOP_LOG` > `RUST_LOG` > CLI level > `info`.
fn build_env_filter(level: Option<&str>) -> EnvFilter {
    // Unparseable values fall through rather than failing startup.
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}
