use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("plugin {plugin} has not been set up")]
    NotSetUp { plugin: String },

    #[error("plugin {plugin} failed during setup: {message}")]
    Setup { plugin: String, message: String },

    #[error("plugin {plugin} failed in {stage}: {message}")]
    HandlerFault {
        plugin: String,
        stage: &'static str,
        message: String,
    },
}

impl Error {
    #[must_use]
    pub fn setup(plugin: impl Into<String>, source: &anyhow::Error) -> Self {
        Self::Setup {
            plugin: plugin.into(),
            message: format!("{source:#}"),
        }
    }

    #[must_use]
    pub fn handler_fault(
        plugin: impl Into<String>,
        stage: &'static str,
        source: &anyhow::Error,
    ) -> Self {
        Self::HandlerFault {
            plugin: plugin.into(),
            stage,
            message: format!("{source:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
