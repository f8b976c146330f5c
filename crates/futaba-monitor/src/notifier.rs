//! The outbound side of a tick: where notifications go.

use std::future::Future;

use futaba_core::model::ChannelId;

use crate::notification::Notification;

/// A chat platform the monitor can deliver notifications through.
///
/// Channels are resolved once per tick and the resolved handle is reused for
/// every send to that channel during the tick.
pub trait Notifier: Send + Sync {
  type Channel: Send + Sync;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up a channel. `None` if it does not exist or is not reachable.
  fn resolve_channel(
    &self,
    channel_id: ChannelId,
  ) -> impl Future<Output = Option<Self::Channel>> + Send + '_;

  fn send<'a>(
    &'a self,
    channel: &'a Self::Channel,
    notification: &'a Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Advertise how many channels currently have subscriptions.
  fn update_presence(
    &self,
    active_channels: usize,
  ) -> impl Future<Output = ()> + Send + '_;
}

/// Presence line for `active_channels` subscribed channels.
pub fn presence_text(active_channels: usize) -> String {
  if active_channels == 0 {
    "購読登録待ち中...".to_owned()
  } else {
    format!("{active_channels}個のチャンネルで動作中!")
  }
}
