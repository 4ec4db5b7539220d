use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Directory(#[from] teambot_directory::Error),

    #[error(transparent)]
    Transport(#[from] teambot_channels::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("roster processor used before setup")]
    NotSetUp,
}

pub type Result<T> = std::result::Result<T, Error>;
