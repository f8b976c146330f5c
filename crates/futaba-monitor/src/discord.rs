//! Discord delivery over the REST API.

use std::time::Duration;

use futaba_core::model::ChannelId;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
  Error, Result,
  notification::Notification,
  notifier::{Notifier, presence_text},
};

pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Channel kinds that accept embeds: guild text and announcement channels.
const MESSAGEABLE_KINDS: [u8; 2] = [0, 5];

/// Connection settings for the Discord API.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
  pub api_base_url: String,
  pub bot_token:    String,
}

/// A resolved text channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscordChannel {
  #[serde(deserialize_with = "snowflake")]
  pub id:   ChannelId,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(rename = "type")]
  pub kind: u8,
}

/// Discord serialises snowflakes as decimal strings.
fn snowflake<'de, D>(deserializer: D) -> std::result::Result<ChannelId, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  raw.parse().map_err(serde::de::Error::custom)
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct DiscordNotifier {
  client: Client,
  config: DiscordConfig,
}

impl DiscordNotifier {
  pub fn new(config: DiscordConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .connect_timeout(Duration::from_secs(10))
      .user_agent(concat!("futaba-search/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.header(
      reqwest::header::AUTHORIZATION,
      format!("Bot {}", self.config.bot_token),
    )
  }

  /// `GET /channels/{id}`
  pub async fn get_channel(&self, channel_id: ChannelId) -> Result<DiscordChannel> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/channels/{channel_id}"))))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Discord { status: status.as_u16(), body });
    }
    Ok(resp.json().await?)
  }

  /// `POST /channels/{id}/messages`
  pub async fn post_embed(
    &self,
    channel_id: ChannelId,
    notification: &Notification,
  ) -> Result<()> {
    let resp = self
      .auth(
        self
          .client
          .post(self.url(&format!("/channels/{channel_id}/messages"))),
      )
      .json(&json!({ "embeds": [notification] }))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Discord { status: status.as_u16(), body });
    }
    Ok(())
  }
}

impl Notifier for DiscordNotifier {
  type Channel = DiscordChannel;
  type Error = Error;

  async fn resolve_channel(&self, channel_id: ChannelId) -> Option<DiscordChannel> {
    match self.get_channel(channel_id).await {
      Ok(channel) if MESSAGEABLE_KINDS.contains(&channel.kind) => Some(channel),
      Ok(channel) => {
        tracing::debug!(%channel_id, kind = channel.kind, "channel does not accept messages");
        None
      }
      Err(e) => {
        tracing::warn!(%channel_id, error = %e, "could not resolve channel");
        None
      }
    }
  }

  async fn send(&self, channel: &DiscordChannel, notification: &Notification) -> Result<()> {
    self.post_embed(channel.id, notification).await
  }

  async fn update_presence(&self, active_channels: usize) {
    // Presence lives on the gateway connection, which this client never opens.
    tracing::debug!(active_channels, presence = %presence_text(active_channels), "presence");
  }
}
