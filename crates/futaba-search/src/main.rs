//! futaba-search: watches the futaba `/b/` board and posts keyword matches to
//! Discord channels.
//!
//! # Usage
//!
//! ```
//! DISCORD_TOKEN=... futaba-search                 # run the monitor
//! futaba-search subscribe --channel 123 --keyword foo
//! futaba-search mute --channel 123 --interval 2h
//! futaba-search tick --console-only               # one cycle, then exit
//! ```

mod logging;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use futaba_core::{clock::SystemClock, model::ChannelId};
use futaba_monitor::{
  commands::{self, Action, Command},
  discord::{DiscordConfig, DiscordNotifier},
  monitor::{Monitor, TickOutcome},
  scheduler::Scheduler,
  source::FutabaSource,
};
use futaba_store_sqlite::SqliteStore;
use settings::Settings;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Futaba thread keyword monitor")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "futaba-search.toml")]
  config: PathBuf,

  /// Log level (trace, debug, info, warn, error).
  #[arg(long, global = true)]
  log_level: Option<String>,

  /// Log file path.
  #[arg(long, global = true, value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Log to the console only.
  #[arg(long, global = true)]
  console_only: bool,

  /// Discord bot token.
  #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true, global = true)]
  discord_token: Option<String>,

  #[command(subcommand)]
  command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// Poll the board until interrupted (the default).
  Run,
  /// Run a single cycle and exit.
  Tick,
  /// Watch a keyword in a channel.
  Subscribe(KeywordArgs),
  /// Stop watching a keyword in a channel.
  Unsubscribe(KeywordArgs),
  /// Show a channel's keywords and mute state.
  List(ChannelArgs),
  /// Silence a channel for a while, e.g. `30m`, `1h`, `2d`.
  Mute(MuteArgs),
  /// Lift a channel's mute.
  Unmute(ChannelArgs),
}

#[derive(Args, Debug)]
struct ChannelArgs {
  #[arg(long)]
  channel: ChannelId,
}

#[derive(Args, Debug)]
struct KeywordArgs {
  #[arg(long)]
  channel: ChannelId,
  #[arg(long)]
  keyword: Option<String>,
}

#[derive(Args, Debug)]
struct MuteArgs {
  #[arg(long)]
  channel:  ChannelId,
  #[arg(long)]
  interval: Option<String>,
}

impl Cmd {
  /// The channel command this maps to, if any.
  fn channel_command(&self) -> Option<(ChannelId, Command)> {
    let (channel, command) = match self {
      Self::Run | Self::Tick => return None,
      Self::Subscribe(a) => (a.channel, keyword_command(Action::Subscribe, &a.keyword)),
      Self::Unsubscribe(a) => (a.channel, keyword_command(Action::Unsubscribe, &a.keyword)),
      Self::List(a) => (a.channel, Command::new(Action::List)),
      Self::Mute(a) => {
        let mut command = Command::new(Action::Mute);
        command.interval = a.interval.clone();
        (a.channel, command)
      }
      Self::Unmute(a) => (a.channel, Command::new(Action::Unmute)),
    };
    Some((channel, command))
  }
}

fn keyword_command(action: Action, keyword: &Option<String>) -> Command {
  let mut command = Command::new(action);
  command.keyword = keyword.clone();
  command
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(level) = &cli.log_level {
    settings.log_level = level.clone();
  }
  if let Some(file) = &cli.log_file {
    settings.log_file = file.clone();
  }
  if cli.discord_token.is_some() {
    settings.discord_token = cli.discord_token.clone();
  }

  let log_file = (!cli.console_only).then_some(settings.log_file.as_path());
  logging::init(&settings.log_level, log_file)?;

  let store = SqliteStore::open(&settings.database_path)
    .await
    .with_context(|| format!("failed to open store at {}", settings.database_path.display()))?;

  let command = cli.command.unwrap_or(Cmd::Run);
  if let Some((channel, command)) = command.channel_command() {
    let reply = commands::execute(&store, &SystemClock, channel, &command).await?;
    println!("{}", reply.message);
    return Ok(());
  }

  let monitor = Arc::new(build_monitor(&settings, store)?);
  match command {
    Cmd::Tick => {
      if monitor.tick().await == TickOutcome::Failed {
        bail!("tick failed");
      }
    }
    _ => {
      let scheduler = Scheduler::new(settings.interval());
      tracing::info!(
        api_url = %settings.api_url,
        interval_secs = settings.monitor_interval,
        database = %settings.database_path.display(),
        "starting futaba-search"
      );
      scheduler.run(monitor, shutdown_signal()).await;
    }
  }

  Ok(())
}

fn build_monitor(
  settings: &Settings,
  store: SqliteStore,
) -> anyhow::Result<Monitor<SqliteStore, FutabaSource, DiscordNotifier>> {
  let Some(token) = settings.discord_token.clone().filter(|t| !t.trim().is_empty()) else {
    bail!("DISCORD_TOKEN is not set");
  };

  let source = FutabaSource::new(settings.api_url.clone()).context("failed to build HTTP client")?;
  let notifier = DiscordNotifier::new(DiscordConfig {
    api_base_url: settings.discord_api_url.clone(),
    bot_token:    token,
  })
  .context("failed to build Discord client")?;

  Ok(Monitor::new(store, source, notifier, Arc::new(SystemClock)))
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => tracing::info!("shutdown requested"),
    Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
  }
}
