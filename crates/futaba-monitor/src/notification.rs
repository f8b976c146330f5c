//! The rich message sent for one match, shaped as a Discord embed.

use chrono::{DateTime, Utc};
use futaba_core::thread::Thread;
use serde::Serialize;

/// Embed accent colour (green).
pub const EMBED_COLOR: u32 = 0x00FF00;

pub fn thread_url(thread_id: &str) -> String {
  format!("https://may.2chan.net/b/res/{thread_id}.htm")
}

pub fn forest_url(thread_id: &str) -> String {
  format!("http://futabaforest.net/b/res/{thread_id}.htm")
}

pub fn ftbucket_url(thread_id: &str) -> String {
  format!("https://may.ftbucket.info/may/cont/may.2chan.net_b_res_{thread_id}/index.htm")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedImage {
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
  pub name:   String,
  pub value:  String,
  pub inline: bool,
}

/// One outbound notification. Serialises directly to an embed object; the
/// thread and keyword it was built from ride along for logging only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  #[serde(skip)]
  pub thread_id:   String,
  #[serde(skip)]
  pub keyword:     String,
  pub title:       String,
  pub description: String,
  pub color:       u32,
  pub timestamp:   DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image:       Option<EmbedImage>,
  pub fields:      Vec<EmbedField>,
}

impl Notification {
  pub fn for_match(thread: &Thread, keyword: &str, at: DateTime<Utc>) -> Self {
    let field = |name: &str, value: String| EmbedField {
      name: name.to_owned(),
      value,
      inline: false,
    };

    Self {
      thread_id:   thread.id.clone(),
      keyword:     keyword.to_owned(),
      title:       format!("キーワード『{keyword}』"),
      description: format!("{}\n{}", thread_url(&thread.id), thread.title),
      color:       EMBED_COLOR,
      timestamp:   at,
      image:       thread
        .thumb_url
        .clone()
        .map(|url| EmbedImage { url }),
      fields:      vec![
        field("ふたばフォレスト", forest_url(&thread.id)),
        field("FTBucket", ftbucket_url(&thread.id)),
      ],
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  fn thread(thumb_url: Option<&str>) -> Thread {
    Thread {
      id:        "111".into(),
      title:     "foo bar".into(),
      subject:   "".into(),
      author:    "としあき".into(),
      posted_at: "24/04/01(月)12:00:00".into(),
      thumb_url: thumb_url.map(str::to_owned),
    }
  }

  #[test]
  fn renders_embed_for_match() {
    let at = Utc.with_ymd_and_hms(2024, 4, 1, 3, 0, 0).unwrap();
    let n = Notification::for_match(
      &thread(Some("https://may.2chan.net/b/thumb/111s.jpg")),
      "foo",
      at,
    );

    assert_eq!(n.title, "キーワード『foo』");
    assert_eq!(n.description, "https://may.2chan.net/b/res/111.htm\nfoo bar");
    assert_eq!(n.fields[0].value, "http://futabaforest.net/b/res/111.htm");
    assert_eq!(
      n.fields[1].value,
      "https://may.ftbucket.info/may/cont/may.2chan.net_b_res_111/index.htm"
    );

    let value = serde_json::to_value(&n).unwrap();
    assert_eq!(value["color"], json!(0x00FF00));
    assert_eq!(value["timestamp"], json!("2024-04-01T03:00:00Z"));
    assert_eq!(value["image"]["url"], json!("https://may.2chan.net/b/thumb/111s.jpg"));
    assert_eq!(value["fields"][0]["name"], json!("ふたばフォレスト"));
    assert_eq!(value["fields"][1]["inline"], json!(false));
    assert!(value.get("thread_id").is_none());
    assert!(value.get("keyword").is_none());
  }

  #[test]
  fn image_omitted_without_thumbnail() {
    let n = Notification::for_match(&thread(None), "foo", Utc::now());
    let value = serde_json::to_value(&n).unwrap();
    assert!(value.get("image").is_none());
  }
}
