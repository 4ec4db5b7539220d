use std::sync::Arc;

use {
    async_trait::async_trait,
    teambot_channels::{BotIdentity, Event, MessageEvent, OutputMessage, Transport},
};

/// A unit of bot behavior driven by the [`PluginHost`](crate::PluginHost).
///
/// Handlers return the replies they want sent instead of sending them; the
/// host queues them and the event loop delivers them with pacing.
#[async_trait]
pub trait Plugin: Send {
    /// Short name used in logs and stats.
    fn name(&self) -> &str;

    /// Called once, after the transport has connected.
    async fn setup(
        &mut self,
        identity: &BotIdentity,
        transport: Arc<dyn Transport>,
    ) -> anyhow::Result<()>;

    /// Chat messages without a subtype that the bot did not author.
    async fn handle(&mut self, message: &MessageEvent) -> anyhow::Result<Vec<OutputMessage>>;

    /// Every event, filtered or not.
    async fn catch_all(&mut self, _event: &Event) -> anyhow::Result<Vec<OutputMessage>> {
        Ok(Vec::new())
    }
}
