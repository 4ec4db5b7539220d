//! Team roster commands.
//!
//! [`RosterProcessor`] is the plugin that answers direct-message commands
//! (`create`, `add`, `join`, ...) against a [`RosterStore`], and broadcasts a
//! ping to every roster member when the bot is mentioned in a channel.
//!
//! [`RosterStore`]: teambot_directory::RosterStore

pub mod command;
pub mod error;
pub mod processor;
pub mod replies;

pub use {
    command::{Command, CommandParser, ParseFault, Verb},
    error::{Error, Result},
    processor::{Outcome, RosterProcessor},
};
