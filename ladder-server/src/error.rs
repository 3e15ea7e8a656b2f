//! Error types for ladder-server.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Startup and serving failures. Request-level failures never get here.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid seed file {path}: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ladder: {0}")]
    Ladder(#[from] ladder::LadderError),

    #[error("storage: {0}")]
    Storage(#[from] ladder::StorageError),

    #[error("database: {0}")]
    Database(String),

    #[error("http: {0}")]
    Http(#[from] ladder_http::HttpError),

    #[error("telemetry: {0}")]
    Telemetry(String),
}
