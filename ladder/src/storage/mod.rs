//! Event sources for the leaderboard.
//!
//! The engine never writes. It asks a store for one [`Snapshot`] per query
//! and ranks from that alone, so `total`, the page and the self rank all
//! describe the same instant.
//!
//! Backends:
//! - In-memory (default), with an incrementally maintained award index
//! - PostgreSQL (enable with the `postgres` feature)
//!
//! ## PostgreSQL Usage
//!
//! ```rust,ignore
//! use ladder::storage::PostgresStore;
//!
//! let store = PostgresStore::connect("postgres://localhost/ladder").await?;
//! store.migrate().await?;
//! let board = Leaderboard::new(Arc::new(store));
//! ```

mod memory;

#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use crate::award::dedupe_awards;
use crate::types::{AwardedEvent, NewPlayEvent, PlayEvent, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("user already registered: {0}")]
    DuplicateUser(String),

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Play history as a store hands it over.
#[derive(Debug, Clone)]
pub enum History {
    /// Raw events; deduplicated by the engine.
    Events(Vec<PlayEvent>),
    /// Already reduced to first awards by an index the store maintains.
    Awards(Vec<AwardedEvent>),
}

impl History {
    pub fn into_awards(self) -> Vec<AwardedEvent> {
        match self {
            History::Events(events) => dedupe_awards(&events),
            History::Awards(awards) => awards,
        }
    }
}

/// One consistent read of users and play history.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Every registered user, in registration order.
    pub users: Vec<User>,
    pub history: History,
}

/// Read side of the user and play-event collections.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Read users and history together.
    async fn snapshot(&self) -> Result<Snapshot>;

    /// Number of registered users.
    async fn user_count(&self) -> Result<u64>;
}

/// Initial data for a store, e.g. loaded from a JSON fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    /// Appended in order, so file order is insertion order.
    #[serde(default)]
    pub events: Vec<NewPlayEvent>,
}

impl SeedData {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
