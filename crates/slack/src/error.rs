use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP-level failure (non-2xx).
    #[error("slack {method} failed ({status}): {body}")]
    Status {
        method: String,
        status: u16,
        body: String,
    },

    /// Slack answered `"ok": false`.
    #[error("slack {method} returned error: {error}")]
    Api { method: String, error: String },
}

impl Error {
    #[must_use]
    pub fn api(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            error: error.into(),
        }
    }
}

impl From<Error> for teambot_channels::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Api { method, error } => Self::rejected(method, error),
            other => Self::external("slack", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
