//! One entry of the board's listing, rebuilt on every poll.

use serde::{Deserialize, Serialize};

/// A thread as seen in a single fetch. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
  pub id:        String,
  /// The opening post's comment body.
  pub title:     String,
  pub subject:   String,
  pub author:    String,
  /// Posting time exactly as the board printed it.
  pub posted_at: String,
  pub thumb_url: Option<String>,
}

impl Thread {
  /// Case-insensitive substring match of `keyword` against the title and
  /// subject, joined by a single space. An empty keyword matches everything.
  pub fn matches(&self, keyword: &str) -> bool {
    let haystack = format!("{} {}", self.title, self.subject).to_lowercase();
    haystack.contains(&keyword.to_lowercase())
  }
}
