//! The `futaba_search` command: subscribe, unsubscribe, list, mute, unmute.
//!
//! Commands act on one channel and produce a [`Reply`]. Validation problems
//! and "nothing to do" outcomes are ephemeral replies, visible only to the
//! caller; successful changes are public.

use std::{fmt, str::FromStr};

use futaba_core::{
  clock::Clock,
  interval,
  model::{ChannelId, normalize_keyword},
  store::WatchStore,
};
use thiserror::Error;

use crate::{Error, Result};

// ─── Actions ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Subscribe,
  Unsubscribe,
  List,
  Mute,
  Unmute,
}

pub const ACTIONS: [Action; 5] = [
  Action::Subscribe,
  Action::Unsubscribe,
  Action::List,
  Action::Mute,
  Action::Unmute,
];

impl Action {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Subscribe => "subscribe",
      Self::Unsubscribe => "unsubscribe",
      Self::List => "list",
      Self::Mute => "mute",
      Self::Unmute => "unmute",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("有効なアクション: subscribe, unsubscribe, list, mute, unmute")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
  type Err = UnknownAction;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    ACTIONS
      .into_iter()
      .find(|action| action.as_str().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| UnknownAction(s.to_owned()))
  }
}

/// Autocomplete: every action whose name contains `current`, ignoring case.
pub fn suggest_actions(current: &str) -> Vec<Action> {
  let current = current.to_lowercase();
  ACTIONS
    .into_iter()
    .filter(|action| action.as_str().contains(current.as_str()))
    .collect()
}

// ─── Command / Reply ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
  pub action:   Action,
  pub keyword:  Option<String>,
  pub interval: Option<String>,
}

impl Command {
  pub fn new(action: Action) -> Self {
    Self { action, keyword: None, interval: None }
  }

  pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
    self.keyword = Some(keyword.into());
    self
  }

  pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
    self.interval = Some(interval.into());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
  pub message:   String,
  pub ephemeral: bool,
}

impl Reply {
  fn public(message: impl Into<String>) -> Self {
    Self { message: message.into(), ephemeral: false }
  }

  fn ephemeral(message: impl Into<String>) -> Self {
    Self { message: message.into(), ephemeral: true }
  }
}

impl From<UnknownAction> for Reply {
  fn from(err: UnknownAction) -> Self { Self::ephemeral(err.to_string()) }
}

const MISSING_KEYWORD: &str = "キーワードを指定してください。";
const MISSING_INTERVAL: &str = "期間を指定してください（例: 30m, 1h, 2d）。";
const INVALID_INTERVAL: &str = "無効な期間形式です。例: 30m, 1h, 2d";

// ─── Execution ───────────────────────────────────────────────────────────────

/// Run `command` against `channel`. Only store failures are errors; every
/// user mistake becomes an ephemeral reply.
pub async fn execute<S: WatchStore>(
  store: &S,
  clock: &dyn Clock,
  channel: ChannelId,
  command: &Command,
) -> Result<Reply> {
  tracing::debug!(
    %channel,
    action = %command.action,
    keyword = ?command.keyword,
    interval = ?command.interval,
    "executing command"
  );

  match command.action {
    Action::Subscribe => {
      let Some(keyword) = keyword_of(command) else {
        return Ok(Reply::ephemeral(MISSING_KEYWORD));
      };
      let added = store
        .add_subscription(channel, &keyword)
        .await
        .map_err(Error::store)?;
      Ok(if added {
        tracing::info!(%channel, %keyword, "subscribed");
        Reply::public(format!("キーワード '{keyword}' の通知を登録しました。"))
      } else {
        Reply::ephemeral(format!("キーワード '{keyword}' は既に登録済みです。"))
      })
    }

    Action::Unsubscribe => {
      let Some(keyword) = keyword_of(command) else {
        return Ok(Reply::ephemeral(MISSING_KEYWORD));
      };
      let removed = store
        .remove_subscription(channel, &keyword)
        .await
        .map_err(Error::store)?;
      Ok(if removed {
        tracing::info!(%channel, %keyword, "unsubscribed");
        Reply::public(format!("キーワード '{keyword}' の通知を解除しました。"))
      } else {
        Reply::ephemeral(format!("キーワード '{keyword}' は登録されていません。"))
      })
    }

    Action::List => {
      let keywords = store
        .list_subscriptions(channel)
        .await
        .map_err(Error::store)?;
      let deadline = store
        .get_mute_deadline(channel)
        .await
        .map_err(Error::store)?;

      let mut message = if keywords.is_empty() {
        "このチャンネルにはキーワードが登録されていません。\n".to_owned()
      } else {
        let bullets: Vec<_> = keywords.iter().map(|kw| format!("• {kw}")).collect();
        format!("このチャンネルの登録キーワード:\n{}\n", bullets.join("\n"))
      };
      if let Some(deadline) = deadline {
        message.push_str(&format!(
          "\n🔇 通知は {} まで無効になっています。",
          interval::format_deadline(deadline)
        ));
      }
      Ok(Reply::public(message))
    }

    Action::Mute => {
      let Some(text) = command.interval.as_deref().filter(|t| !t.trim().is_empty())
      else {
        return Ok(Reply::ephemeral(MISSING_INTERVAL));
      };
      let deadline = interval::parse_positive(text)
        .ok()
        .and_then(|delta| clock.now().checked_add_signed(delta));
      let Some(deadline) = deadline else {
        return Ok(Reply::ephemeral(INVALID_INTERVAL));
      };

      store.mute(channel, deadline).await.map_err(Error::store)?;
      tracing::info!(%channel, %deadline, "muted");
      Ok(Reply::public(format!(
        "🔇 通知を {} まで無効にしました。",
        interval::format_deadline(deadline)
      )))
    }

    Action::Unmute => {
      let unmuted = store.unmute(channel).await.map_err(Error::store)?;
      Ok(if unmuted {
        tracing::info!(%channel, "unmuted");
        Reply::public("🔔 通知を再開しました。")
      } else {
        Reply::ephemeral("このチャンネルはミュートされていません。")
      })
    }
  }
}

fn keyword_of(command: &Command) -> Option<String> {
  normalize_keyword(command.keyword.as_deref()?).ok()
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::{DateTime, TimeDelta, TimeZone, Utc};
  use futaba_core::clock::ManualClock;
  use futaba_store_sqlite::SqliteStore;

  use super::*;

  const CHANNEL: ChannelId = ChannelId(12345);

  fn start() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap() }

  async fn setup() -> (SqliteStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let store = SqliteStore::open_in_memory()
      .await
      .unwrap()
      .with_clock(clock.clone());
    (store, clock)
  }

  async fn run(store: &SqliteStore, clock: &ManualClock, command: Command) -> Reply {
    execute(store, clock, CHANNEL, &command).await.unwrap()
  }

  #[test]
  fn actions_parse_case_insensitively() {
    assert_eq!("subscribe".parse::<Action>(), Ok(Action::Subscribe));
    assert_eq!("UNMUTE".parse::<Action>(), Ok(Action::Unmute));
    assert_eq!(" List ".parse::<Action>(), Ok(Action::List));

    let err = "frobnicate".parse::<Action>().unwrap_err();
    let reply = Reply::from(err);
    assert!(reply.ephemeral);
    assert_eq!(reply.message, "有効なアクション: subscribe, unsubscribe, list, mute, unmute");
  }

  #[test]
  fn suggestions_match_anywhere_in_the_name() {
    assert_eq!(suggest_actions(""), ACTIONS.to_vec());
    assert_eq!(suggest_actions("sub"), vec![Action::Subscribe, Action::Unsubscribe]);
    assert_eq!(suggest_actions("MUTE"), vec![Action::Mute, Action::Unmute]);
    assert_eq!(suggest_actions("is"), vec![Action::List]);
    assert!(suggest_actions("zzz").is_empty());
  }

  #[tokio::test]
  async fn subscribe_and_unsubscribe() {
    let (s, clock) = setup().await;

    let reply = run(&s, &clock, Command::new(Action::Subscribe).with_keyword("  foo ")).await;
    assert_eq!(reply, Reply::public("キーワード 'foo' の通知を登録しました。"));

    let reply = run(&s, &clock, Command::new(Action::Subscribe).with_keyword("foo")).await;
    assert_eq!(reply, Reply::ephemeral("キーワード 'foo' は既に登録済みです。"));

    let reply = run(&s, &clock, Command::new(Action::Unsubscribe).with_keyword("foo")).await;
    assert_eq!(reply, Reply::public("キーワード 'foo' の通知を解除しました。"));

    let reply = run(&s, &clock, Command::new(Action::Unsubscribe).with_keyword("foo")).await;
    assert_eq!(reply, Reply::ephemeral("キーワード 'foo' は登録されていません。"));
  }

  #[tokio::test]
  async fn blank_keyword_is_rejected_without_touching_the_store() {
    let (s, clock) = setup().await;

    for command in [
      Command::new(Action::Subscribe),
      Command::new(Action::Subscribe).with_keyword("   "),
      Command::new(Action::Unsubscribe),
    ] {
      assert_eq!(run(&s, &clock, command).await, Reply::ephemeral(MISSING_KEYWORD));
    }
    assert!(s.list_all_subscriptions().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn list_shows_keywords_and_mute_state() {
    let (s, clock) = setup().await;

    let reply = run(&s, &clock, Command::new(Action::List)).await;
    assert_eq!(reply.message, "このチャンネルにはキーワードが登録されていません。\n");

    s.add_subscription(CHANNEL, "foo").await.unwrap();
    s.add_subscription(CHANNEL, "bar").await.unwrap();
    let reply = run(&s, &clock, Command::new(Action::List)).await;
    assert_eq!(reply.message, "このチャンネルの登録キーワード:\n• foo\n• bar\n");
    assert!(!reply.ephemeral);

    let until = start() + TimeDelta::hours(1);
    s.mute(CHANNEL, until).await.unwrap();
    let reply = run(&s, &clock, Command::new(Action::List)).await;
    assert!(reply.message.ends_with(&format!(
      "\n🔇 通知は {} まで無効になっています。",
      interval::format_deadline(until)
    )));

    clock.advance(TimeDelta::hours(2));
    let reply = run(&s, &clock, Command::new(Action::List)).await;
    assert!(!reply.message.contains("🔇"));
  }

  #[tokio::test]
  async fn mute_sets_deadline_from_clock() {
    let (s, clock) = setup().await;

    let reply = run(&s, &clock, Command::new(Action::Mute).with_interval("30m")).await;
    let until = start() + TimeDelta::minutes(30);
    assert_eq!(
      reply,
      Reply::public(format!("🔇 通知を {} まで無効にしました。", interval::format_deadline(until)))
    );
    assert_eq!(s.get_mute_deadline(CHANNEL).await.unwrap(), Some(until));
  }

  #[tokio::test]
  async fn mute_rejects_missing_invalid_and_zero_intervals() {
    let (s, clock) = setup().await;

    assert_eq!(
      run(&s, &clock, Command::new(Action::Mute)).await,
      Reply::ephemeral(MISSING_INTERVAL)
    );
    for bad in ["forever", "10", "-5m", "0m"] {
      assert_eq!(
        run(&s, &clock, Command::new(Action::Mute).with_interval(bad)).await,
        Reply::ephemeral(INVALID_INTERVAL),
        "{bad}"
      );
    }
    assert!(!s.is_muted(CHANNEL).await.unwrap());
  }

  #[tokio::test]
  async fn unmute_reports_whether_channel_was_muted() {
    let (s, clock) = setup().await;

    let reply = run(&s, &clock, Command::new(Action::Unmute)).await;
    assert_eq!(reply, Reply::ephemeral("このチャンネルはミュートされていません。"));

    run(&s, &clock, Command::new(Action::Mute).with_interval("1h")).await;
    let reply = run(&s, &clock, Command::new(Action::Unmute)).await;
    assert_eq!(reply, Reply::public("🔔 通知を再開しました。"));
    assert!(!s.is_muted(CHANNEL).await.unwrap());
  }
}
