use std::fmt;

use serde::{Deserialize, Serialize};

// ── Identifiers ─────────────────────────────────────────────────────────────

/// Platform channel identifier.
///
/// The leading character tags the channel kind: `C` for multi-party channels,
/// `D` for direct (one-to-one) conversations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

/// Kind of conversation a [`ChannelId`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    MultiParty,
    Direct,
    Other,
}

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ChannelKind {
        match self.0.chars().next() {
            Some('C') => ChannelKind::MultiParty,
            Some('D') => ChannelKind::Direct,
            _ => ChannelKind::Other,
        }
    }

    /// Inline channel reference, e.g. `<#C024BE91L>`.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Platform user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inline user mention, e.g. `<@U024BE7LH>`.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ── Bot identity ────────────────────────────────────────────────────────────

/// Who the bot is on the platform, as reported at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub user_id: UserId,
    pub name: String,
}

impl BotIdentity {
    pub fn new(user_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }

    pub fn mention(&self) -> String {
        self.user_id.mention()
    }

    /// Whether `text` mentions the bot.
    ///
    /// Some clients format mentions as `<@ID|name>` rather than `<@ID>`, so
    /// both encodings are recognized.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        text.contains(&self.mention())
            || text.contains(&format!("<@{}|{}>", self.user_id, self.name))
    }

    pub fn is_self(&self, user: &UserId) -> bool {
        &self.user_id == user
    }
}

// ── Events ──────────────────────────────────────────────────────────────────

/// A chat message posted to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub channel: ChannelId,
    pub sender: UserId,
    pub text: String,
    /// Set for joins, edits, topic changes and similar non-chat messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

/// One inbound occurrence from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Message(MessageEvent),
    /// Any other platform event (hello, presence, reactions, ...).
    Other { kind: String },
}

impl Event {
    /// Plain chat message without a subtype.
    pub fn message(
        channel: impl Into<ChannelId>,
        sender: impl Into<UserId>,
        text: impl Into<String>,
    ) -> Self {
        Self::Message(MessageEvent {
            channel: channel.into(),
            sender: sender.into(),
            text: text.into(),
            subtype: None,
        })
    }

    pub fn other(kind: impl Into<String>) -> Self {
        Self::Other { kind: kind.into() }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::Other { kind } => kind,
        }
    }

    pub fn channel(&self) -> Option<&ChannelId> {
        match self {
            Self::Message(msg) => Some(&msg.channel),
            Self::Other { .. } => None,
        }
    }
}

// ── Outbound ────────────────────────────────────────────────────────────────

/// A reply waiting to be sent, in enqueue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    pub channel: ChannelId,
    pub text: String,
}

impl OutputMessage {
    pub fn new(channel: impl Into<ChannelId>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
        }
    }
}
