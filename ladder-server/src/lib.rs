//! # ladder-server
//!
//! HTTP service exposing the ladder engine:
//!
//! - `GET /leaderboard?window=&limit=&offset=&userId=`
//! - `GET /health`
//!
//! Data comes from PostgreSQL when a database URL is configured (needs the
//! `postgres` feature), otherwise from an in-memory store optionally seeded
//! from a JSON file.

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{Cli, LogConfig, ServerConfig, StoreConfig};
pub use error::{Result, ServerError};

use ladder::{EventStore, Leaderboard, MemoryStore, SeedData};
use ladder_http::{CorsMiddleware, HttpServer, LoggingMiddleware};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Open the configured store, loading the seed file if one is set.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn EventStore>> {
    match config {
        StoreConfig::Memory { seed } => {
            let store = match seed {
                Some(path) => MemoryStore::from_seed(read_seed(path)?)?,
                None => MemoryStore::new(),
            };
            info!(
                events = store.event_count(),
                awards = store.award_count(),
                "memory store ready"
            );
            Ok(Arc::new(store))
        }
        StoreConfig::Postgres { url, seed } => open_postgres(url, seed.as_deref()).await,
    }
}

#[cfg(feature = "postgres")]
async fn open_postgres(url: &str, seed: Option<&Path>) -> Result<Arc<dyn EventStore>> {
    let store = ladder::PostgresStore::connect(url)
        .await
        .map_err(|e| ServerError::Database(e.to_string()))?;
    store
        .migrate()
        .await
        .map_err(|e| ServerError::Database(e.to_string()))?;

    if let Some(path) = seed {
        let seed = read_seed(path)?;
        for user in &seed.users {
            store.insert_user(user).await?;
        }
        for event in seed.events {
            store.insert_event(event).await?;
        }
        info!(path = %path.display(), "postgres seeded");
    }

    info!("postgres store ready");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_url: &str, _seed: Option<&Path>) -> Result<Arc<dyn EventStore>> {
    Err(ServerError::Database(
        "a database URL was given but this build lacks the `postgres` feature".into(),
    ))
}

fn read_seed(path: &Path) -> Result<SeedData> {
    let content = std::fs::read_to_string(path).map_err(|source| ServerError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    SeedData::from_json(&content).map_err(|source| ServerError::Seed {
        path: path.to_path_buf(),
        source,
    })
}

/// HTTP server with routes and middleware, not yet listening.
pub fn http_server(config: &ServerConfig, board: Arc<Leaderboard>) -> Result<HttpServer> {
    let cors = if config.cors_origin == "*" {
        CorsMiddleware::permissive()
    } else {
        CorsMiddleware::origin(&config.cors_origin)
    };

    Ok(HttpServer::bind(config.bind.as_str())?
        .router(api::router(board))
        .middleware(LoggingMiddleware)
        .middleware(cors))
}

/// Open the store and serve until `shutdown` resolves.
pub async fn run(config: ServerConfig, shutdown: impl Future<Output = ()> + Send) -> Result<()> {
    let store = open_store(&config.store).await?;
    let board = Arc::new(Leaderboard::new(store));

    http_server(&config, board)?
        .serve_with_shutdown(shutdown)
        .await?;
    info!("server stopped");
    Ok(())
}
