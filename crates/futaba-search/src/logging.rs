//! Console and file logging.

use std::{fs::OpenOptions, path::Path, sync::Arc};

use anyhow::Context as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// With `file` set, records are also appended there without ANSI colours;
/// the parent directory is created if needed.
pub fn init(level: &str, file: Option<&Path>) -> anyhow::Result<()> {
  let configured = default_filter(level)?;
  let filter = EnvFilter::try_from_default_env().unwrap_or(configured);

  let file_layer = match file {
    Some(path) => {
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
      {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create log directory {}", parent.display()))?;
      }
      let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
      Some(fmt::layer().with_ansi(false).with_writer(Arc::new(log)))
    }
    None => None,
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_target(true))
    .with(file_layer)
    .try_init()
    .context("failed to install tracing subscriber")?;

  tracing::debug!(level, file = ?file, "logging initialised");
  Ok(())
}

/// `level` for everything, with the HTTP stack held at `warn`.
fn default_filter(level: &str) -> anyhow::Result<EnvFilter> {
  let level: LevelFilter = level
    .trim()
    .parse()
    .with_context(|| format!("invalid log level {level:?}"))?;
  Ok(
    EnvFilter::builder()
      .with_default_directive(level.into())
      .parse_lossy("hyper=warn,reqwest=warn"),
  )
}
