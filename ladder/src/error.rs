//! Error types for the leaderboard engine.

use crate::storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LadderError>;

#[derive(Error, Debug)]
pub enum LadderError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A user's summed score no longer fits in 64 bits.
    #[error("score overflow for user {user_id}")]
    ScoreOverflow { user_id: String },

    /// The caller went away before ranking finished.
    #[error("query cancelled")]
    Cancelled,

    #[error("ranking task failed: {reason}")]
    Task { reason: String },
}

impl LadderError {
    pub fn score_overflow(user_id: impl Into<String>) -> Self {
        Self::ScoreOverflow {
            user_id: user_id.into(),
        }
    }

    pub fn task(reason: impl Into<String>) -> Self {
        Self::Task {
            reason: reason.into(),
        }
    }
}
