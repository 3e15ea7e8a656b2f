//! Error types for ladder-http.

use std::io;

/// Result type for ladder-http operations.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Server setup and transport errors.
///
/// Per-request failures never show up here; handlers turn them into
/// responses themselves.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    /// Address did not parse or resolved to nothing.
    #[error("invalid address: {0}")]
    InvalidAddr(String),
}
