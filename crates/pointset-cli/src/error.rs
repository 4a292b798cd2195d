use pointset::{PointSetError, StreamError};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] PointSetError),

    #[error("Failed to read or write collection '{path}': {source}", path = path.display())]
    Stream {
        path: PathBuf,
        #[source]
        source: StreamError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn stream(path: impl Into<PathBuf>) -> impl FnOnce(StreamError) -> Self {
        let path = path.into();
        move |source| CliError::Stream { path, source }
    }
}
