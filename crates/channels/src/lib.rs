//! Messaging-platform abstractions shared by every teambot crate.
//!
//! Defines the inbound [`Event`] model, channel/user identifiers, the bot's
//! own [`BotIdentity`], outbound [`OutputMessage`]s, and the [`Transport`]
//! trait that concrete platform adapters implement.

pub mod error;
pub mod event;
pub mod memory;
pub mod transport;

pub use {
    error::{Error, Result},
    event::{BotIdentity, ChannelId, ChannelKind, Event, MessageEvent, OutputMessage, UserId},
    memory::MemoryTransport,
    transport::Transport,
};
