// Takeout Puzzle Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TakeoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("ExifTool error: {0}")]
    ExifTool(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid group: {0}")]
    InvalidGroup(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for TakeoutError {
    fn from(err: anyhow::Error) -> Self {
        TakeoutError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TakeoutError>;
