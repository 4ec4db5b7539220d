use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    teambot_channels::{BotIdentity, ChannelId, Error, Event, Result, Transport, UserId},
    tokio::sync::mpsc::error::TryRecvError,
    tokio_tungstenite::tungstenite::Message,
    tokio_util::sync::CancellationToken,
    tracing::info,
};

use crate::{
    api::SlackApi,
    config::SlackAccountConfig,
    socket::{self, SocketHandle},
};

/// [`Transport`] over the Slack Web API and Socket Mode.
pub struct SlackTransport {
    api: Arc<SlackApi>,
    config: SlackAccountConfig,
    socket: Mutex<Option<SocketHandle>>,
    cancel: CancellationToken,
}

impl SlackTransport {
    pub fn new(config: SlackAccountConfig) -> crate::Result<Self> {
        Ok(Self {
            api: Arc::new(SlackApi::new(&config)?),
            config,
            socket: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    fn with_socket<T>(&self, f: impl FnOnce(&mut SocketHandle) -> Result<T>) -> Result<T> {
        let mut guard = self.socket.lock().unwrap_or_else(|e| e.into_inner());
        let socket = guard.as_mut().ok_or(Error::NotConnected)?;
        f(socket)
    }
}

impl Drop for SlackTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl Transport for SlackTransport {
    fn name(&self) -> &str {
        "slack"
    }

    async fn connect(&self) -> Result<BotIdentity> {
        let identity = self.api.auth_test().await?;
        info!(bot = %identity.user_id, name = %identity.name, "slack bot authenticated");

        let handle = socket::spawn(
            Arc::clone(&self.api),
            self.config.max_reconnect_backoff,
            self.cancel.child_token(),
        );
        *self.socket.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(identity)
    }

    async fn read_events(&self) -> Result<Vec<Event>> {
        self.with_socket(|socket| {
            let mut events = Vec::new();
            loop {
                match socket.events.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => return Ok(events),
                    Err(TryRecvError::Disconnected) if events.is_empty() => {
                        return Err(Error::disconnected("socket mode listener stopped"));
                    },
                    Err(TryRecvError::Disconnected) => return Ok(events),
                }
            }
        })
    }

    async fn send(&self, channel: &ChannelId, text: &str) -> Result<()> {
        Ok(self.api.post_message(channel, text).await?)
    }

    async fn heartbeat(&self) -> Result<()> {
        self.with_socket(|socket| {
            socket
                .writer
                .send(Message::Ping(Default::default()))
                .map_err(|_| Error::disconnected("socket mode listener stopped"))
        })
    }

    async fn channel_members(&self, channel: &ChannelId) -> Result<HashSet<UserId>> {
        Ok(self.api.conversation_members(channel).await?)
    }
}
