//! Persistent records owned by a [`WatchStore`](crate::store::WatchStore).

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Channel id ──────────────────────────────────────────────────────────────

/// Chat-platform channel identifier (a 64-bit snowflake).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for ChannelId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim()
      .parse()
      .map(Self)
      .map_err(|_| Error::InvalidChannelId(s.to_owned()))
  }
}

impl From<u64> for ChannelId {
  fn from(id: u64) -> Self { Self(id) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A channel's interest in a keyword. `(channel_id, keyword)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub channel_id: ChannelId,
  pub keyword:    String,
}

/// A suppression window for one channel. At most one per channel; muting
/// again replaces the window rather than extending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutedChannel {
  pub channel_id:  ChannelId,
  pub muted_until: DateTime<Utc>,
  pub muted_at:    DateTime<Utc>,
}

impl MutedChannel {
  /// A row whose deadline has passed is not a mute, whether or not it has
  /// been swept yet.
  pub fn is_active_at(&self, now: DateTime<Utc>) -> bool { self.muted_until > now }
}

/// Trim a user-supplied keyword and refuse an empty one. An empty keyword
/// would match every thread.
pub fn normalize_keyword(raw: &str) -> Result<String, Error> {
  let keyword = raw.trim();
  if keyword.is_empty() {
    return Err(Error::EmptyKeyword);
  }
  Ok(keyword.to_owned())
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, TimeZone};

  use super::*;

  #[test]
  fn channel_id_parses_snowflakes() {
    assert_eq!("1234567890123456789".parse::<ChannelId>(), Ok(ChannelId(1234567890123456789)));
    assert_eq!(" 42 ".parse::<ChannelId>(), Ok(ChannelId(42)));
    assert!(matches!("abc".parse::<ChannelId>(), Err(Error::InvalidChannelId(_))));
    assert!("-1".parse::<ChannelId>().is_err());
  }

  #[test]
  fn mute_is_inactive_once_deadline_passes() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mute = MutedChannel {
      channel_id:  ChannelId(1),
      muted_until: now + TimeDelta::hours(1),
      muted_at:    now,
    };
    assert!(mute.is_active_at(now));
    assert!(!mute.is_active_at(now + TimeDelta::hours(1)));
  }

  #[test]
  fn keywords_are_trimmed_and_must_be_non_empty() {
    assert_eq!(normalize_keyword("  foo "), Ok("foo".to_owned()));
    assert_eq!(normalize_keyword("   "), Err(Error::EmptyKeyword));
    assert_eq!(normalize_keyword(""), Err(Error::EmptyKeyword));
  }
}
