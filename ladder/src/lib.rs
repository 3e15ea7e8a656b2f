//! # Ladder
//!
//! Leaderboard engine that turns an append-only history of play events into
//! deterministic, time-windowed, paginated rankings.
//!
//! ## Pipeline
//!
//! - **Awards**: only a user's first attempt at a (game, difficulty) counts
//! - **Windows**: `24h`, `7d`, `30d`, `all`; an award counts toward a window
//!   only if its first-ever occurrence falls inside it
//! - **Aggregation**: every registered user gets a score, zero included
//! - **Ranking**: score descending, earlier registration first on ties
//! - **Self rank**: one user's score and rank, independent of the page
//!
//! ## Example
//!
//! ```rust,ignore
//! use ladder::{Leaderboard, LeaderboardQuery, MemoryStore, Window};
//!
//! let store = Arc::new(MemoryStore::new());
//! let board = Leaderboard::new(store);
//!
//! let query = LeaderboardQuery::new(Window::Week).with_user("user-42");
//! let response = board.query(&query).await?;
//! ```

pub mod aggregate;
pub mod award;
pub mod engine;
pub mod error;
pub mod query;
pub mod rank;
pub mod self_rank;
pub mod storage;
pub mod types;
pub mod window;

// Re-exports
pub use aggregate::aggregate_scores;
pub use award::{dedupe_awards, AwardChange, AwardIndex};
pub use engine::{compute_leaderboard, Leaderboard};
pub use error::{LadderError, Result};
pub use query::LeaderboardQuery;
pub use rank::{PageRequest, RankedPopulation, DEFAULT_LIMIT, MAX_LIMIT};
pub use self_rank::resolve_self_rank;
pub use storage::{EventStore, History, MemoryStore, SeedData, Snapshot, StorageError};
pub use types::{
    AwardKey, AwardedEvent, LeaderboardEntry, LeaderboardPage, LeaderboardResponse, NewPlayEvent,
    PlayEvent, SelfRank, User, UserScore,
};
pub use window::{now_millis, select_window, Window};

#[cfg(feature = "postgres")]
pub use storage::PostgresStore;
