//! Durable team directory.
//!
//! Maps a channel id to the [`Roster`] of user ids bound to it. The
//! [`RosterStore`] trait is the seam; [`SqliteDirectory`] is the durable
//! implementation (one row per roster, committed before each call returns).

pub mod error;
pub mod roster;
pub mod sqlite;
pub mod store;

pub use {
    error::{Error, Result},
    roster::Roster,
    sqlite::SqliteDirectory,
    store::{DirectoryStats, RosterStore},
};
