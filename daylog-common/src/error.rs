//! Common error types for daylog

use thiserror::Error;

/// Common result type for daylog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the daylog crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timecode string or frame rate that cannot be interpreted
    #[error("Invalid timecode: {0}")]
    Timecode(String),
}
