//! Plugin contract and the host that runs one plugin.
//!
//! The [`PluginHost`] owns the plugin, the bot identity and the outbound
//! FIFO queue. It filters non-chat and self-authored messages, isolates
//! plugin faults, and keeps per-plugin [`PluginStats`].

pub mod error;
pub mod host;
pub mod plugin;

pub use {
    error::{Error, Result},
    host::{PluginHost, PluginStats},
    plugin::Plugin,
};
