//! Polling, matching and notification for the futaba thread watcher.
//!
//! One [`Monitor::tick`](monitor::Monitor::tick) sweeps stale state, fetches
//! the board's listing through a [`ThreadSource`](source::ThreadSource),
//! matches every thread against every unmuted subscription in the
//! [`WatchStore`](futaba_core::store::WatchStore), and hands each new match to
//! a [`Notifier`](notifier::Notifier). The [`Scheduler`](scheduler::Scheduler)
//! runs ticks back to back at a fixed interval.

#![allow(async_fn_in_trait)]

pub mod commands;
pub mod discord;
pub mod error;
pub mod monitor;
pub mod notification;
pub mod notifier;
pub mod scheduler;
pub mod source;

pub use error::{Error, Result};

#[cfg(test)]
mod test_support;
