//! [`SqliteStore`]: the SQLite implementation of [`WatchStore`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::OptionalExtension as _;

use futaba_core::{
  clock::{Clock, SystemClock},
  model::{ChannelId, MutedChannel, Subscription},
  store::WatchStore,
};

use crate::{
  encode::{decode_channel, encode_channel, encode_dt, RawMutedChannel},
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A watch store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and clock are reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Arc<dyn Clock>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation. The
  /// parent directory is created if it does not exist yet.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }

    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the store's time source.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  fn now(&self) -> DateTime<Utc> { self.clock.now() }

  /// Run a single `DELETE`/`INSERT` and report how many rows it touched.
  async fn execute(
    &self,
    sql: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params_from_iter(params))?))
      .await?;
    Ok(changed)
  }
}

// ─── WatchStore impl ─────────────────────────────────────────────────────────

impl WatchStore for SqliteStore {
  type Error = crate::Error;

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn add_subscription(&self, channel: ChannelId, keyword: &str) -> Result<bool> {
    let inserted = self
      .execute(
        "INSERT INTO subscriptions (channel_id, keyword) VALUES (?1, ?2)
         ON CONFLICT (channel_id, keyword) DO NOTHING",
        vec![encode_channel(channel).into(), keyword.to_owned().into()],
      )
      .await?;
    Ok(inserted > 0)
  }

  async fn remove_subscription(&self, channel: ChannelId, keyword: &str) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM subscriptions WHERE channel_id = ?1 AND keyword = ?2",
        vec![encode_channel(channel).into(), keyword.to_owned().into()],
      )
      .await?;
    Ok(removed > 0)
  }

  async fn list_subscriptions(&self, channel: ChannelId) -> Result<Vec<String>> {
    let channel_raw = encode_channel(channel);

    let keywords = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT keyword FROM subscriptions WHERE channel_id = ?1 ORDER BY id")?;
        let rows = stmt
          .query_map(rusqlite::params![channel_raw], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(keywords)
  }

  async fn list_all_subscriptions(&self) -> Result<Vec<Subscription>> {
    let raws: Vec<(i64, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT channel_id, keyword FROM subscriptions ORDER BY id")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(|(channel_id, keyword)| Subscription {
          channel_id: decode_channel(channel_id),
          keyword,
        })
        .collect(),
    )
  }

  // ── Notification ledger ───────────────────────────────────────────────────

  async fn is_notified(
    &self,
    thread_id: &str,
    keyword: &str,
    channel: ChannelId,
  ) -> Result<bool> {
    let thread_id   = thread_id.to_owned();
    let keyword     = keyword.to_owned();
    let channel_raw = encode_channel(channel);

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM notified_threads
               WHERE thread_id = ?1 AND keyword = ?2 AND channel_id = ?3",
              rusqlite::params![thread_id, keyword, channel_raw],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;

    Ok(found)
  }

  async fn mark_notified(
    &self,
    thread_id: &str,
    keyword: &str,
    channel: ChannelId,
  ) -> Result<bool> {
    let inserted = self
      .execute(
        "INSERT INTO notified_threads (thread_id, keyword, channel_id, notified_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (thread_id, keyword, channel_id) DO NOTHING",
        vec![
          thread_id.to_owned().into(),
          keyword.to_owned().into(),
          encode_channel(channel).into(),
          encode_dt(self.now()).into(),
        ],
      )
      .await?;
    Ok(inserted > 0)
  }

  async fn sweep_old_notifications(&self, retention_days: u32) -> Result<usize> {
    // A window reaching past the representable range covers every record.
    let Some(cutoff) = TimeDelta::try_days(i64::from(retention_days))
      .and_then(|window| self.now().checked_sub_signed(window))
    else {
      return Ok(0);
    };

    let removed = self
      .execute(
        "DELETE FROM notified_threads WHERE notified_at <= ?1",
        vec![encode_dt(cutoff).into()],
      )
      .await?;

    if removed > 0 {
      tracing::info!(removed, retention_days, "swept old notification records");
    }
    Ok(removed)
  }

  // ── Mutes ─────────────────────────────────────────────────────────────────

  async fn mute(&self, channel: ChannelId, until: DateTime<Utc>) -> Result<MutedChannel> {
    let muted = MutedChannel {
      channel_id:  channel,
      muted_until: until,
      muted_at:    self.now(),
    };

    self
      .execute(
        "INSERT INTO muted_channels (channel_id, muted_until, muted_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (channel_id) DO UPDATE SET
             muted_until = excluded.muted_until,
             muted_at    = excluded.muted_at",
        vec![
          encode_channel(channel).into(),
          encode_dt(muted.muted_until).into(),
          encode_dt(muted.muted_at).into(),
        ],
      )
      .await?;

    Ok(muted)
  }

  async fn unmute(&self, channel: ChannelId) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM muted_channels WHERE channel_id = ?1",
        vec![encode_channel(channel).into()],
      )
      .await?;
    Ok(removed > 0)
  }

  async fn is_muted(&self, channel: ChannelId) -> Result<bool> {
    Ok(self.get_mute_deadline(channel).await?.is_some())
  }

  async fn get_mute_deadline(&self, channel: ChannelId) -> Result<Option<DateTime<Utc>>> {
    let channel_raw = encode_channel(channel);
    let now         = self.now();

    let raw: Option<RawMutedChannel> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT channel_id, muted_until, muted_at FROM muted_channels
               WHERE channel_id = ?1",
              rusqlite::params![channel_raw],
              |row| {
                Ok(RawMutedChannel {
                  channel_id:  row.get(0)?,
                  muted_until: row.get(1)?,
                  muted_at:    row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    let Some(raw) = raw else { return Ok(None) };
    let muted = raw.into_muted_channel()?;
    Ok(muted.is_active_at(now).then_some(muted.muted_until))
  }

  async fn sweep_expired_mutes(&self) -> Result<usize> {
    let removed = self
      .execute(
        "DELETE FROM muted_channels WHERE muted_until <= ?1",
        vec![encode_dt(self.now()).into()],
      )
      .await?;

    if removed > 0 {
      tracing::debug!(removed, "swept expired mutes");
    }
    Ok(removed)
  }
}
