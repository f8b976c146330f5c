//! The `WatchStore` trait.
//!
//! Implemented by storage backends (e.g. `futaba-store-sqlite`). The monitor
//! and the command surface depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::model::{ChannelId, MutedChannel, Subscription};

/// How long a notification record is kept before the sweep removes it.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the subscription / notification / mute store.
///
/// Every method is individually transactional: it either commits its whole
/// effect or none of it. Uniqueness collisions are never errors; they are
/// reported through the boolean return values. "Now" is taken from the
/// store's own clock.
pub trait WatchStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// Register `keyword` for `channel`. Returns `false` if the pair already
  /// exists.
  fn add_subscription<'a>(
    &'a self,
    channel: ChannelId,
    keyword: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Returns `true` iff a subscription was removed.
  fn remove_subscription<'a>(
    &'a self,
    channel: ChannelId,
    keyword: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Keywords registered for one channel, oldest first.
  fn list_subscriptions(
    &self,
    channel: ChannelId,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Every subscription of every channel.
  fn list_all_subscriptions(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  // ── Notification ledger ───────────────────────────────────────────────

  fn is_notified<'a>(
    &'a self,
    thread_id: &'a str,
    keyword: &'a str,
    channel: ChannelId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Record the triple as notified. A no-op when it already is; returns
  /// whether a new record was written.
  fn mark_notified<'a>(
    &'a self,
    thread_id: &'a str,
    keyword: &'a str,
    channel: ChannelId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete notification records at least `retention_days` old. Returns the
  /// number removed.
  fn sweep_old_notifications(
    &self,
    retention_days: u32,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Mutes ─────────────────────────────────────────────────────────────

  /// Mute `channel` until `until`, replacing any existing window.
  fn mute(
    &self,
    channel: ChannelId,
    until: DateTime<Utc>,
  ) -> impl Future<Output = Result<MutedChannel, Self::Error>> + Send + '_;

  /// Returns `true` iff a mute row existed and was deleted.
  fn unmute(
    &self,
    channel: ChannelId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// `true` iff the channel has a window ending after now.
  fn is_muted(
    &self,
    channel: ChannelId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// End of the channel's active mute window, if any.
  fn get_mute_deadline(
    &self,
    channel: ChannelId,
  ) -> impl Future<Output = Result<Option<DateTime<Utc>>, Self::Error>> + Send + '_;

  /// Delete every mute whose window has ended. Returns the number removed.
  fn sweep_expired_mutes(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
