//! Parser for human-entered durations such as `30m`, `1h` or `2 days`.
//!
//! Grammar (after trimming the whole input, case-insensitive):
//!
//! ```text
//! interval = digits *space unit
//! digits   = 1*( "0".."9" | "０".."９" )
//! unit     = "m" | "min" | "minute" | "minutes"
//!          | "h" | "hour" | "hours"
//!          | "d" | "day" | "days"
//! ```
//!
//! Anything else, including a sign or trailing text, is rejected with `None`.

use chrono::{DateTime, Local, TimeDelta, Utc};

use crate::{Error, Result};

// ─── Units ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
  Minutes,
  Hours,
  Days,
}

impl Unit {
  fn from_token(token: &str) -> Option<Self> {
    match token.to_ascii_lowercase().as_str() {
      "m" | "min" | "minute" | "minutes" => Some(Self::Minutes),
      "h" | "hour" | "hours" => Some(Self::Hours),
      "d" | "day" | "days" => Some(Self::Days),
      _ => None,
    }
  }

  fn delta(self, value: i64) -> Option<TimeDelta> {
    match self {
      Self::Minutes => TimeDelta::try_minutes(value),
      Self::Hours => TimeDelta::try_hours(value),
      Self::Days => TimeDelta::try_days(value),
    }
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse `text` into a duration. Returns `None` for anything that is not a
/// non-negative integer followed by a recognised unit.
///
/// `"0m"` is accepted and yields a zero duration; see [`parse_positive`] for
/// the variant that rejects it.
pub fn parse(text: &str) -> Option<TimeDelta> {
  let text = text.trim();
  let digits_end = text
    .find(|c: char| decimal_digit(c).is_none())
    .unwrap_or(text.len());
  if digits_end == 0 {
    return None;
  }

  let (number, rest) = text.split_at(digits_end);
  let value = number.chars().try_fold(0_i64, |acc, c| {
    acc
      .checked_mul(10)?
      .checked_add(i64::from(decimal_digit(c)?))
  })?;
  let unit = Unit::from_token(rest.trim_start())?;
  unit.delta(value)
}

/// ASCII and full-width (U+FF10..=U+FF19) digits, as typed through a
/// Japanese IME.
fn decimal_digit(c: char) -> Option<u32> {
  match c {
    '0'..='9' => c.to_digit(10),
    '０'..='９' => Some(c as u32 - '０' as u32),
    _ => None,
  }
}

/// Like [`parse`], but reports why the text was rejected and refuses a zero
/// duration.
pub fn parse_positive(text: &str) -> Result<TimeDelta> {
  let delta = parse(text).ok_or_else(|| Error::InvalidInterval(text.to_owned()))?;
  if delta.is_zero() {
    return Err(Error::ZeroInterval(text.to_owned()));
  }
  Ok(delta)
}

/// `now + parse(text)`, or `None` if the text does not parse or the deadline
/// would fall outside the representable range.
pub fn resolve_deadline(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
  now.checked_add_signed(parse(text)?)
}

/// Render a deadline for display to users, in the host's local time zone.
pub fn format_deadline(deadline: DateTime<Utc>) -> String {
  deadline
    .with_timezone(&Local)
    .format("%Y-%m-%d %H:%M:%S")
    .to_string()
}
