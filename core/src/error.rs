use thiserror::Error;

use crate::scene::ImportError;

/// Errors surfaced by [`Viewer`](crate::Viewer) operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
