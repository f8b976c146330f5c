//! Core types and trait definitions for the futaba thread watcher.
//!
//! No HTTP or database code lives here: only the domain records, keyword
//! matching, interval parsing and the [`WatchStore`](store::WatchStore)
//! abstraction every backend implements.

#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod interval;
pub mod model;
pub mod store;
pub mod thread;

pub use error::{Error, Result};
