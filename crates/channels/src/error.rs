use std::error::Error as StdError;

/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors shared across adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid transport input: {message}")]
    InvalidInput { message: String },

    /// The transport has not been connected yet.
    #[error("transport not connected")]
    NotConnected,

    /// The connection to the platform was lost and is not coming back.
    #[error("transport disconnected: {reason}")]
    Disconnected { reason: String },

    /// The platform answered with an application-level error.
    #[error("platform rejected {method}: {reason}")]
    Rejected { method: String, reason: String },

    /// Wrapped source error from an external dependency.
    #[error("transport operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn disconnected(reason: impl std::fmt::Display) -> Self {
        Self::Disconnected {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn rejected(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            method: method.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
