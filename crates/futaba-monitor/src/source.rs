//! Fetching and parsing the board's JSON thread listing.
//!
//! The listing looks like:
//!
//! ```json
//! {"res": {"1234": {"com": "...", "now": "...", "name": "...", "sub": "...",
//!                   "thumb": "/b/thumb/1s.jpg", "src": "/b/src/1.jpg"}}}
//! ```
//!
//! Transport problems and bad statuses are logged and reported as `None`;
//! the next poll is the only retry.

use std::{future::Future, time::Duration};

use futaba_core::thread::Thread;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};

use crate::Result;

/// The board's default JSON listing.
pub const DEFAULT_API_URL: &str = "https://may.2chan.net/b/futaba.php?mode=json";

/// Base that relative thumbnail and image paths are resolved against.
pub const IMAGE_HOST: &str = "https://may.2chan.net";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Something that can produce one raw thread listing per call.
pub trait ThreadSource: Send + Sync {
  /// Fetch the listing once. `None` means "skip this tick".
  fn fetch(&self) -> impl Future<Output = Option<Value>> + Send + '_;
}

// ─── HTTP source ─────────────────────────────────────────────────────────────

/// Fetches the listing over HTTP with a single GET per call.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct FutabaSource {
  client: Client,
  url:    String,
}

impl FutabaSource {
  pub fn new(url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .connect_timeout(Duration::from_secs(10))
      .user_agent(concat!("futaba-search/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, url: url.into() })
  }
}

impl ThreadSource for FutabaSource {
  async fn fetch(&self) -> Option<Value> {
    let response = match self.client.get(&self.url).send().await {
      Ok(response) => response,
      Err(e) => {
        tracing::error!(url = %self.url, error = ?e, "failed to fetch thread listing");
        return None;
      }
    };

    let status = response.status();
    if status != StatusCode::OK {
      tracing::warn!(url = %self.url, %status, "thread listing request failed");
      return None;
    }

    match response.json::<Value>().await {
      Ok(value) => Some(value),
      Err(e) => {
        tracing::error!(url = %self.url, error = ?e, "thread listing body is not valid JSON");
        None
      }
    }
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Normalise a raw listing into threads, in the order the board listed them.
///
/// A listing without a `"res"` object yields no threads; so do entries that
/// are not objects. Missing text fields become empty strings.
pub fn parse_listing(listing: &Value) -> Vec<Thread> {
  let Some(entries) = listing.get("res").and_then(Value::as_object) else {
    return Vec::new();
  };

  entries
    .iter()
    .filter_map(|(id, entry)| {
      let fields = entry.as_object()?;
      Some(Thread {
        id:        id.clone(),
        title:     text_field(fields, "com"),
        subject:   text_field(fields, "sub"),
        author:    text_field(fields, "name"),
        posted_at: text_field(fields, "now"),
        thumb_url: image_url(fields),
      })
    })
    .collect()
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
  fields
    .get(key)
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_owned()
}

/// Prefer the thumbnail, fall back to the full image.
fn image_url(fields: &Map<String, Value>) -> Option<String> {
  ["thumb", "src"]
    .iter()
    .filter_map(|key| fields.get(*key).and_then(Value::as_str))
    .find(|path| !path.is_empty())
    .map(|path| format!("{IMAGE_HOST}{path}"))
}
