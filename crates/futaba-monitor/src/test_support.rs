//! Shared test fixtures: a local HTTP server and fakes for the tick cycle.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicUsize, Ordering},
};

use axum::Router;
use chrono::{DateTime, Utc};
use futaba_core::{
  model::{ChannelId, MutedChannel, Subscription},
  store::WatchStore,
};
use futaba_store_sqlite::SqliteStore;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::{notification::Notification, notifier::Notifier, source::ThreadSource};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0")
    .await
    .expect("bind test listener");
  let address = listener.local_addr().expect("local addr");
  tokio::spawn(async move {
    axum::serve(listener, router).await.expect("test server");
  });
  format!("http://{address}")
}

/// A base URL nothing is listening on.
pub async fn dead_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0")
    .await
    .expect("bind test listener");
  let address = listener.local_addr().expect("local addr");
  drop(listener);
  format!("http://{address}")
}

// ─── Cycle fakes ─────────────────────────────────────────────────────────────

/// Serves the same listing on every fetch.
pub struct StaticSource {
  listing: Option<Value>,
}

impl StaticSource {
  pub fn new(listing: Option<Value>) -> Self { Self { listing } }
}

impl ThreadSource for StaticSource {
  async fn fetch(&self) -> Option<Value> { self.listing.clone() }
}

#[derive(Debug, Error)]
#[error("send rejected")]
pub struct SendRejected;

#[derive(Default)]
struct Recorded {
  sent:        Vec<(ChannelId, Notification)>,
  presence:    Vec<usize>,
  resolutions: Vec<ChannelId>,
}

/// Records every call. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
  recorded: Arc<Mutex<Recorded>>,
  unknown:  Vec<ChannelId>,
  failing:  bool,
}

impl RecordingNotifier {
  /// A notifier whose every send fails.
  pub fn failing() -> Self { Self { failing: true, ..Self::default() } }

  /// Make `channel` unresolvable.
  pub fn with_unknown(mut self, channel: ChannelId) -> Self {
    self.unknown.push(channel);
    self
  }

  pub fn sent(&self) -> Vec<(ChannelId, Notification)> {
    self.recorded.lock().unwrap().sent.clone()
  }

  pub fn presence(&self) -> Vec<usize> { self.recorded.lock().unwrap().presence.clone() }

  pub fn resolutions(&self, channel: ChannelId) -> usize {
    self
      .recorded
      .lock()
      .unwrap()
      .resolutions
      .iter()
      .filter(|c| **c == channel)
      .count()
  }
}

impl Notifier for RecordingNotifier {
  type Channel = ChannelId;
  type Error = SendRejected;

  async fn resolve_channel(&self, channel_id: ChannelId) -> Option<ChannelId> {
    self.recorded.lock().unwrap().resolutions.push(channel_id);
    (!self.unknown.contains(&channel_id)).then_some(channel_id)
  }

  async fn send(&self, channel: &ChannelId, notification: &Notification) -> Result<(), SendRejected> {
    if self.failing {
      return Err(SendRejected);
    }
    self
      .recorded
      .lock()
      .unwrap()
      .sent
      .push((*channel, notification.clone()));
    Ok(())
  }

  async fn update_presence(&self, active_channels: usize) {
    self.recorded.lock().unwrap().presence.push(active_channels);
  }
}

// ─── Faulty store ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreFault {
  #[error("injected store failure")]
  Injected,
  #[error(transparent)]
  Sqlite(#[from] futaba_store_sqlite::Error),
}

/// Wraps an in-memory [`SqliteStore`] and fails selected calls on demand.
pub struct FaultyStore {
  inner:               SqliteStore,
  fail_sweeps:         bool,
  /// How many upcoming `is_muted` calls fail.
  failing_mute_checks: AtomicUsize,
}

impl FaultyStore {
  pub fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      fail_sweeps: false,
      failing_mute_checks: AtomicUsize::new(0),
    }
  }

  /// Every sweep fails.
  pub fn with_failing_sweeps(mut self) -> Self {
    self.fail_sweeps = true;
    self
  }

  /// The next `count` calls to `is_muted` fail.
  pub fn with_failing_mute_checks(self, count: usize) -> Self {
    self.failing_mute_checks.store(count, Ordering::SeqCst);
    self
  }

  fn take_mute_failure(&self) -> bool {
    self
      .failing_mute_checks
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
  }
}

impl WatchStore for FaultyStore {
  type Error = StoreFault;

  async fn add_subscription(&self, channel: ChannelId, keyword: &str) -> Result<bool, StoreFault> {
    Ok(self.inner.add_subscription(channel, keyword).await?)
  }

  async fn remove_subscription(&self, channel: ChannelId, keyword: &str) -> Result<bool, StoreFault> {
    Ok(self.inner.remove_subscription(channel, keyword).await?)
  }

  async fn list_subscriptions(&self, channel: ChannelId) -> Result<Vec<String>, StoreFault> {
    Ok(self.inner.list_subscriptions(channel).await?)
  }

  async fn list_all_subscriptions(&self) -> Result<Vec<Subscription>, StoreFault> {
    Ok(self.inner.list_all_subscriptions().await?)
  }

  async fn is_notified(
    &self,
    thread_id: &str,
    keyword: &str,
    channel: ChannelId,
  ) -> Result<bool, StoreFault> {
    Ok(self.inner.is_notified(thread_id, keyword, channel).await?)
  }

  async fn mark_notified(
    &self,
    thread_id: &str,
    keyword: &str,
    channel: ChannelId,
  ) -> Result<bool, StoreFault> {
    Ok(self.inner.mark_notified(thread_id, keyword, channel).await?)
  }

  async fn sweep_old_notifications(&self, retention_days: u32) -> Result<usize, StoreFault> {
    if self.fail_sweeps {
      return Err(StoreFault::Injected);
    }
    Ok(self.inner.sweep_old_notifications(retention_days).await?)
  }

  async fn mute(&self, channel: ChannelId, until: DateTime<Utc>) -> Result<MutedChannel, StoreFault> {
    Ok(self.inner.mute(channel, until).await?)
  }

  async fn unmute(&self, channel: ChannelId) -> Result<bool, StoreFault> {
    Ok(self.inner.unmute(channel).await?)
  }

  async fn is_muted(&self, channel: ChannelId) -> Result<bool, StoreFault> {
    if self.take_mute_failure() {
      return Err(StoreFault::Injected);
    }
    Ok(self.inner.is_muted(channel).await?)
  }

  async fn get_mute_deadline(&self, channel: ChannelId) -> Result<Option<DateTime<Utc>>, StoreFault> {
    Ok(self.inner.get_mute_deadline(channel).await?)
  }

  async fn sweep_expired_mutes(&self) -> Result<usize, StoreFault> {
    if self.fail_sweeps {
      return Err(StoreFault::Injected);
    }
    Ok(self.inner.sweep_expired_mutes().await?)
  }
}
