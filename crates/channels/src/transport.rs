use std::collections::HashSet;

use async_trait::async_trait;

use crate::{
    Result,
    event::{BotIdentity, ChannelId, Event, UserId},
};

/// Connection to a messaging platform. Each platform adapter implements this.
///
/// All methods take `&self`; adapters keep their connection handle behind
/// interior mutability so the event loop and the roster processor can share
/// one `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short adapter name for logs (e.g. "slack").
    fn name(&self) -> &str;

    /// Open the connection and report who the bot is.
    async fn connect(&self) -> Result<BotIdentity>;

    /// Drain events received since the last call, in arrival order.
    ///
    /// Returns an empty batch when nothing arrived. Never blocks waiting for
    /// traffic.
    async fn read_events(&self) -> Result<Vec<Event>>;

    /// Post `text` to `channel`.
    async fn send(&self, channel: &ChannelId, text: &str) -> Result<()>;

    /// Keep-alive ping on the open connection.
    async fn heartbeat(&self) -> Result<()>;

    /// Current member ids of `channel`.
    async fn channel_members(&self, channel: &ChannelId) -> Result<HashSet<UserId>>;
}
