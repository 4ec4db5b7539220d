use std::{
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use {
    async_trait::async_trait,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    },
    teambot_channels::{ChannelId, UserId},
    tracing::{debug, info},
};

use crate::{Error, Result, roster::Roster, store::RosterStore};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct TeamRow {
    channel_id: String,
    members: String,
}

impl TeamRow {
    fn into_entry(self) -> Result<(ChannelId, Roster)> {
        let members: Vec<UserId> = serde_json::from_str(&self.members)
            .map_err(|e| Error::corrupt(&self.channel_id, e.to_string()))?;
        Ok((ChannelId::new(self.channel_id), members.into_iter().collect()))
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// SQLite-backed team directory.
///
/// Uses a single connection in WAL mode with `synchronous = FULL`, so every
/// `put`/`delete` is one autocommit statement that is on disk before the call
/// returns.
pub struct SqliteDirectory {
    pool: SqlitePool,
}

impl SqliteDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the directory database at `path` and run
    /// pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        info!(path = %path.display(), "team directory opened");
        Ok(Self::new(pool))
    }

    /// Private in-memory directory, for tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        let options: SqliteConnectOptions = "sqlite::memory:".parse()?;
        // The database lives only as long as its one connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Create the `teams` table if it does not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[async_trait]
impl RosterStore for SqliteDirectory {
    async fn get(&self, channel: &ChannelId) -> Result<Option<Roster>> {
        let row = sqlx::query_as::<_, TeamRow>(
            "SELECT channel_id, members FROM teams WHERE channel_id = ?",
        )
        .bind(channel.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.into_entry().map(|(_, roster)| roster))
            .transpose()
    }

    async fn put(&self, channel: &ChannelId, roster: &Roster) -> Result<()> {
        let members = serde_json::to_string(roster)?;
        let now = now_ms();
        sqlx::query(
            r#"INSERT INTO teams (channel_id, members, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(channel_id) DO UPDATE SET
                 members = excluded.members,
                 updated_at = excluded.updated_at"#,
        )
        .bind(channel.as_str())
        .bind(&members)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        debug!(channel = %channel, members = roster.len(), "roster committed");
        Ok(())
    }

    async fn delete(&self, channel: &ChannelId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM teams WHERE channel_id = ?")
            .bind(channel.as_str())
            .execute(&self.pool)
            .await?;
        debug!(channel = %channel, "roster deleted");
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<(ChannelId, Roster)>> {
        let rows = sqlx::query_as::<_, TeamRow>(
            "SELECT channel_id, members FROM teams ORDER BY channel_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TeamRow::into_entry).collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::store::DirectoryStats};

    fn roster(ids: &[&str]) -> Roster {
        ids.iter().map(|id| UserId::new(*id)).collect()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = SqliteDirectory::in_memory().await.unwrap();
        let c1 = ChannelId::new("C1");

        dir.put(&c1, &roster(&["U1", "U2"])).await.unwrap();
        assert_eq!(dir.get(&c1).await.unwrap(), Some(roster(&["U1", "U2"])));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = SqliteDirectory::in_memory().await.unwrap();
        assert!(dir.get(&ChannelId::new("C404")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_roster_is_distinct_from_missing() {
        let dir = SqliteDirectory::in_memory().await.unwrap();
        let c1 = ChannelId::new("C1");

        dir.put(&c1, &Roster::new()).await.unwrap();
        assert_eq!(dir.get(&c1).await.unwrap(), Some(Roster::new()));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = SqliteDirectory::in_memory().await.unwrap();
        let c1 = ChannelId::new("C1");

        dir.put(&c1, &roster(&["U1"])).await.unwrap();
        dir.put(&c1, &roster(&["U2"])).await.unwrap();
        assert_eq!(dir.get(&c1).await.unwrap(), Some(roster(&["U2"])));
        assert_eq!(dir.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = SqliteDirectory::in_memory().await.unwrap();
        let c1 = ChannelId::new("C1");

        dir.put(&c1, &roster(&["U1"])).await.unwrap();
        assert!(dir.delete(&c1).await.unwrap());
        assert!(dir.get(&c1).await.unwrap().is_none());
        assert!(!dir.delete(&c1).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let dir = SqliteDirectory::in_memory().await.unwrap();
        dir.put(&ChannelId::new("C2"), &roster(&["U1", "U2"]))
            .await
            .unwrap();
        dir.put(&ChannelId::new("C1"), &roster(&["U2", "U3"]))
            .await
            .unwrap();

        let entries = dir.list().await.unwrap();
        let channels: Vec<&str> = entries.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(channels, vec!["C1", "C2"]);

        assert_eq!(dir.stats().await.unwrap(), DirectoryStats {
            users: 3,
            teams: 2,
        });
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let dir = SqliteDirectory::in_memory().await.unwrap();
        sqlx::query("INSERT INTO teams VALUES ('C1', 'not json', 0, 0)")
            .execute(&dir.pool)
            .await
            .unwrap();

        let err = dir.get(&ChannelId::new("C1")).await.unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("teams.db");
        let c1 = ChannelId::new("C1");

        {
            let dir = SqliteDirectory::open(&path).await.unwrap();
            dir.put(&c1, &roster(&["U1"])).await.unwrap();
            dir.close().await;
        }

        let dir = SqliteDirectory::open(&path).await.unwrap();
        assert_eq!(dir.get(&c1).await.unwrap(), Some(roster(&["U1"])));
    }
}
