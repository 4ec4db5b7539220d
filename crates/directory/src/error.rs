use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt roster record for {channel}: {reason}")]
    Corrupt { channel: String, reason: String },
}

impl Error {
    #[must_use]
    pub fn corrupt(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
