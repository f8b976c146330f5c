//! Layered runtime configuration.
//!
//! Precedence, lowest first: built-in defaults, the optional TOML file,
//! `FUTABA_*` environment variables. Command-line flags are applied on top by
//! `main`.

use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::{Context as _, bail};
use config::{Config, Environment, File};
use futaba_monitor::{discord::DEFAULT_API_BASE_URL, source::DEFAULT_API_URL};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "FUTABA";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub api_url:          String,
  /// Seconds between ticks.
  pub monitor_interval: u64,
  pub database_path:    PathBuf,
  pub log_level:        String,
  pub log_file:         PathBuf,
  pub discord_api_url:  String,
  #[serde(default)]
  pub discord_token:    Option<String>,
}

impl Settings {
  /// Load from `file` (if it exists) and the process environment.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    Self::from_sources(file, Environment::with_prefix(ENV_PREFIX))
  }

  pub fn from_sources(file: &Path, env: Environment) -> anyhow::Result<Self> {
    let settings: Self = Config::builder()
      .set_default("api_url", DEFAULT_API_URL)?
      .set_default("monitor_interval", 60)?
      .set_default("database_path", "futaba_bot.db")?
      .set_default("log_level", "info")?
      .set_default("log_file", "logs/futaba_search.log")?
      .set_default("discord_api_url", DEFAULT_API_BASE_URL)?
      .add_source(File::from(file).required(false))
      .add_source(env)
      .build()
      .with_context(|| format!("failed to read configuration from {}", file.display()))?
      .try_deserialize()
      .context("invalid configuration")?;

    if settings.monitor_interval == 0 {
      bail!("monitor_interval must be at least 1 second");
    }
    Ok(settings)
  }

  pub fn interval(&self) -> Duration { Duration::from_secs(self.monitor_interval) }
}
