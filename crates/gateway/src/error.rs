use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport failed to connect: {0}")]
    Connect(#[source] teambot_channels::Error),

    #[error(transparent)]
    Plugin(#[from] teambot_plugins::Error),

    #[error("transport {op} failed {consecutive} times in a row: {source}")]
    TransportFault {
        op: &'static str,
        consecutive: u32,
        #[source]
        source: teambot_channels::Error,
    },

    #[error("event loop is {state}, expected {expected}")]
    InvalidState {
        state: &'static str,
        expected: &'static str,
    },
}

impl Error {
    #[must_use]
    pub fn transport_fault(
        op: &'static str,
        consecutive: u32,
        source: teambot_channels::Error,
    ) -> Self {
        Self::TransportFault {
            op,
            consecutive,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
