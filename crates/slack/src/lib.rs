//! Slack adapter: Web API over `reqwest`, inbound events over Socket Mode.

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod socket;
pub mod transport;

pub use {
    api::SlackApi,
    config::SlackAccountConfig,
    error::{Error, Result},
    transport::SlackTransport,
};
