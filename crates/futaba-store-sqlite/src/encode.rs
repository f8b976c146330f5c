//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! and a `Z` suffix, so that SQL string comparison orders them correctly.
//! Channel ids are stored bit-for-bit in a signed INTEGER column.

use chrono::{DateTime, SecondsFormat, Utc};
use futaba_core::model::{ChannelId, MutedChannel};

use crate::{Error, Result};

// ─── ChannelId ───────────────────────────────────────────────────────────────

pub fn encode_channel(id: ChannelId) -> i64 { id.0 as i64 }

pub fn decode_channel(raw: i64) -> ChannelId { ChannelId(raw as u64) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `muted_channels` row.
pub struct RawMutedChannel {
  pub channel_id:  i64,
  pub muted_until: String,
  pub muted_at:    String,
}

impl RawMutedChannel {
  pub fn into_muted_channel(self) -> Result<MutedChannel> {
    Ok(MutedChannel {
      channel_id:  decode_channel(self.channel_id),
      muted_until: decode_dt(&self.muted_until)?,
      muted_at:    decode_dt(&self.muted_at)?,
    })
  }
}
