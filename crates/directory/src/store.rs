use std::collections::HashSet;

use {async_trait::async_trait, teambot_channels::ChannelId};

use crate::{Result, roster::Roster};

/// Aggregate counts over every roster in a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    /// Distinct users across all rosters.
    pub users: usize,
    /// Number of rosters.
    pub teams: usize,
}

impl DirectoryStats {
    pub fn from_entries(entries: &[(ChannelId, Roster)]) -> Self {
        let users: HashSet<_> = entries.iter().flat_map(|(_, r)| r.iter()).collect();
        Self {
            users: users.len(),
            teams: entries.len(),
        }
    }
}

/// Persistent mapping from channel id to roster.
///
/// Implementations must make `put` and `delete` durable before returning.
/// Callers guarantee a single writer, so no locking is expected here.
#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn get(&self, channel: &ChannelId) -> Result<Option<Roster>>;

    /// Create or replace the roster for `channel`.
    async fn put(&self, channel: &ChannelId, roster: &Roster) -> Result<()>;

    /// Remove the roster for `channel`. Returns whether one existed.
    async fn delete(&self, channel: &ChannelId) -> Result<bool>;

    /// Every roster, ordered by channel id.
    async fn list(&self) -> Result<Vec<(ChannelId, Roster)>>;

    async fn stats(&self) -> Result<DirectoryStats> {
        Ok(DirectoryStats::from_entries(&self.list().await?))
    }
}
