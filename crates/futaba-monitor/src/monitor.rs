//! One poll → match → notify cycle.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use futaba_core::{
  clock::Clock,
  model::ChannelId,
  store::{DEFAULT_RETENTION_DAYS, WatchStore},
  thread::Thread,
};

use crate::{
  Error, Result,
  notification::Notification,
  notifier::Notifier,
  source::{ThreadSource, parse_listing},
};

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
  pub threads:         usize,
  pub subscriptions:   usize,
  pub active_channels: usize,
  /// Subscriptions skipped because their channel is muted.
  pub muted:           usize,
  /// Subscriptions skipped because their channel could not be resolved.
  pub unresolved:      usize,
  pub dispatched:      usize,
  pub failed:          usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
  /// The listing could not be fetched; nothing else was attempted.
  Skipped,
  Completed(TickReport),
  /// The tick aborted on a store error. Already-sent notifications stay sent.
  Failed,
}

pub struct Monitor<S, F, N> {
  store:          S,
  source:         F,
  notifier:       N,
  clock:          Arc<dyn Clock>,
  retention_days: u32,
}

impl<S, F, N> Monitor<S, F, N>
where
  S: WatchStore,
  F: ThreadSource,
  N: Notifier,
{
  pub fn new(store: S, source: F, notifier: N, clock: Arc<dyn Clock>) -> Self {
    Self {
      store,
      source,
      notifier,
      clock,
      retention_days: DEFAULT_RETENTION_DAYS,
    }
  }

  pub fn with_retention_days(mut self, days: u32) -> Self {
    self.retention_days = days;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  #[cfg(test)]
  pub(crate) fn source(&self) -> &F { &self.source }

  /// Run one tick. Never fails; errors are logged and reported as
  /// [`TickOutcome::Failed`].
  pub async fn tick(&self) -> TickOutcome {
    match self.run_tick().await {
      Ok(None) => TickOutcome::Skipped,
      Ok(Some(report)) => {
        tracing::info!(
          threads = report.threads,
          subscriptions = report.subscriptions,
          dispatched = report.dispatched,
          failed = report.failed,
          muted = report.muted,
          unresolved = report.unresolved,
          "tick complete"
        );
        TickOutcome::Completed(report)
      }
      Err(e) => {
        tracing::error!(error = %e, "tick failed");
        TickOutcome::Failed
      }
    }
  }

  /// The tick body. `Ok(None)` when the listing was unavailable.
  pub async fn run_tick(&self) -> Result<Option<TickReport>> {
    self.sweep().await;

    let Some(listing) = self.source.fetch().await else {
      tracing::warn!("no thread listing this tick");
      return Ok(None);
    };
    let threads = parse_listing(&listing);
    tracing::debug!(threads = threads.len(), "fetched listing");

    let subscriptions = self
      .store
      .list_all_subscriptions()
      .await
      .map_err(Error::store)?;
    let active_channels = subscriptions
      .iter()
      .map(|sub| sub.channel_id)
      .collect::<HashSet<_>>()
      .len();
    self.notifier.update_presence(active_channels).await;

    let mut report = TickReport {
      threads: threads.len(),
      subscriptions: subscriptions.len(),
      active_channels,
      ..TickReport::default()
    };

    let mut channels: HashMap<ChannelId, Option<N::Channel>> = HashMap::new();

    for sub in &subscriptions {
      if self
        .store
        .is_muted(sub.channel_id)
        .await
        .map_err(Error::store)?
      {
        tracing::debug!(channel = %sub.channel_id, keyword = %sub.keyword, "channel muted");
        report.muted += 1;
        continue;
      }

      if !channels.contains_key(&sub.channel_id) {
        let resolved = self.notifier.resolve_channel(sub.channel_id).await;
        channels.insert(sub.channel_id, resolved);
      }
      let Some(Some(channel)) = channels.get(&sub.channel_id) else {
        tracing::warn!(channel = %sub.channel_id, "channel not found");
        report.unresolved += 1;
        continue;
      };

      self
        .notify_matches(&threads, sub.channel_id, &sub.keyword, channel, &mut report)
        .await?;
    }

    Ok(Some(report))
  }

  async fn notify_matches(
    &self,
    threads: &[Thread],
    channel_id: ChannelId,
    keyword: &str,
    channel: &N::Channel,
    report: &mut TickReport,
  ) -> Result<()> {
    for thread in threads {
      if self
        .store
        .is_notified(&thread.id, keyword, channel_id)
        .await
        .map_err(Error::store)?
      {
        continue;
      }
      if !thread.matches(keyword) {
        continue;
      }

      let notification = Notification::for_match(thread, keyword, self.clock.now());
      match self.notifier.send(channel, &notification).await {
        Ok(()) => {
          tracing::info!(channel = %channel_id, thread = %thread.id, %keyword, "notified");
          report.dispatched += 1;
        }
        Err(e) => {
          tracing::error!(
            channel = %channel_id,
            thread = %thread.id,
            %keyword,
            error = %e,
            "failed to send notification"
          );
          report.failed += 1;
        }
      }

      // Marked even when the send failed: a broken channel must not be
      // retried every tick.
      self
        .store
        .mark_notified(&thread.id, keyword, channel_id)
        .await
        .map_err(Error::store)?;
    }
    Ok(())
  }

  async fn sweep(&self) {
    if let Err(e) = self.store.sweep_expired_mutes().await {
      tracing::error!(error = %e, "failed to sweep expired mutes");
    }
    if let Err(e) = self.store.sweep_old_notifications(self.retention_days).await {
      tracing::error!(error = %e, "failed to sweep old notifications");
    }
  }
}
