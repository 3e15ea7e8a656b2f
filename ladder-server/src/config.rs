//! Server configuration.
//!
//! Three layers, later ones win: built-in defaults, an optional TOML file
//! (`--config`), then command-line flags.

use crate::error::{Result, ServerError};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "0.0.0.0:7360";

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "ladder-server", version, about = "Serve first-award leaderboards over HTTP")]
pub struct Cli {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address (default 0.0.0.0:7360)
    #[arg(long)]
    pub bind: Option<String>,

    /// PostgreSQL URL; without it the in-memory store is used
    #[arg(long)]
    pub database_url: Option<String>,

    /// JSON file with `users` and `events` to load at startup
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Log filter, e.g. "info" or "ladder=debug,info" (RUST_LOG wins)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// OTLP collector endpoint (needs the `otlp` feature)
    #[arg(long)]
    pub otlp_endpoint: Option<String>,

    /// Allowed CORS origin (default "*")
    #[arg(long)]
    pub cors_origin: Option<String>,
}

/// Config file contents. Every field is optional.
///
/// ```toml
/// bind = "127.0.0.1:7360"
/// seed = "seed.json"
/// cors_origin = "chrome-extension://abcdef"
///
/// [log]
/// level = "ladder=debug,info"
/// json = true
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub database_url: Option<String>,
    pub seed: Option<PathBuf>,
    pub cors_origin: Option<String>,
    pub log: FileLogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
    pub otlp_endpoint: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ServerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ServerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Where leaderboard data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory { seed: Option<PathBuf> },
    Postgres { url: String, seed: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub service_name: String,
    pub level: String,
    pub json: bool,
    pub otlp_endpoint: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "ladder-server".into(),
            level: "info".into(),
            json: false,
            otlp_endpoint: None,
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub store: StoreConfig,
    pub cors_origin: String,
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            store: StoreConfig::Memory { seed: None },
            cors_origin: "*".into(),
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the file named by `--config` (if any) and merge.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(file, cli))
    }

    pub fn merge(file: FileConfig, cli: &Cli) -> Self {
        let defaults = Self::default();

        let seed = cli.seed.clone().or(file.seed);
        let store = match cli.database_url.clone().or(file.database_url) {
            Some(url) => StoreConfig::Postgres { url, seed },
            None => StoreConfig::Memory { seed },
        };

        Self {
            bind: cli.bind.clone().or(file.bind).unwrap_or(defaults.bind),
            store,
            cors_origin: cli
                .cors_origin
                .clone()
                .or(file.cors_origin)
                .unwrap_or(defaults.cors_origin),
            log: LogConfig {
                service_name: defaults.log.service_name,
                level: cli
                    .log_level
                    .clone()
                    .or(file.log.level)
                    .unwrap_or(defaults.log.level),
                json: cli.json_logs || file.log.json.unwrap_or(defaults.log.json),
                otlp_endpoint: cli.otlp_endpoint.clone().or(file.log.otlp_endpoint),
            },
        }
    }
}
