//! Error types for `futaba-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("keyword must not be empty")]
  EmptyKeyword,

  #[error("invalid interval: {0:?}")]
  InvalidInterval(String),

  #[error("interval must be longer than zero: {0:?}")]
  ZeroInterval(String),

  #[error("invalid channel id: {0:?}")]
  InvalidChannelId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
