//! Layered runtime settings.
//!
//! Lowest to highest precedence: built-in defaults, an optional TOML file,
//! `RABBIT_TOP_*` environment variables, then CLI flags (applied by the
//! binary after loading).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::data::Thresholds;

/// Prefix of the environment variables read as settings.
pub const ENV_PREFIX: &str = "RABBIT_TOP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between fetches; also the key poll timeout.
    pub refresh_secs: u64,
    /// Per-request timeout for the management API.
    pub request_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_secs: 3,
            request_timeout_secs: 10,
            log_file: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, `config_path` and the process
    /// environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_path, environment())
    }

    fn load_with_env(config_path: Option<&Path>, env: Environment) -> Result<Self> {
        let defaults = Config::try_from(&Settings::default())?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let settings: Settings = builder
            .add_source(env)
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the render loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_secs == 0 {
            bail!("refresh_secs must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        for (name, pair) in self.thresholds.pairs() {
            if pair.warning > pair.error {
                bail!(
                    "thresholds.{}: warning ({}) is above error ({})",
                    name,
                    pair.warning,
                    pair.error
                );
            }
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
