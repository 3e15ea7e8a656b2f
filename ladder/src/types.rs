//! Records the engine reads and the ranked views it produces.
//!
//! Timestamps are Unix milliseconds throughout.

use crate::window::Window;
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    /// Display name; users may register without one.
    #[serde(default)]
    pub username: Option<String>,
    /// Registration time. Earlier registrants win score ties on the page.
    pub created_at: i64,
}

impl User {
    pub fn new(user_id: impl Into<String>, created_at: i64) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
            created_at,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// A play event as submitted by the session recorder, before the store
/// assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayEvent {
    pub user_id: String,
    pub game_id: String,
    pub difficulty: String,
    pub score: u64,
    pub started_at: i64,
}

impl NewPlayEvent {
    pub fn new(
        user_id: impl Into<String>,
        game_id: impl Into<String>,
        difficulty: impl Into<String>,
        score: u64,
        started_at: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            game_id: game_id.into(),
            difficulty: difficulty.into(),
            score,
            started_at,
        }
    }

    /// Attach the store-assigned insertion id.
    pub fn into_event(self, id: u64) -> PlayEvent {
        PlayEvent {
            id,
            user_id: self.user_id,
            game_id: self.game_id,
            difficulty: self.difficulty,
            score: self.score,
            started_at: self.started_at,
        }
    }
}

/// One recorded play. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayEvent {
    /// Insertion sequence, strictly increasing in append order.
    pub id: u64,
    pub user_id: String,
    pub game_id: String,
    pub difficulty: String,
    pub score: u64,
    pub started_at: i64,
}

impl PlayEvent {
    pub fn key(&self) -> AwardKey {
        AwardKey {
            user_id: self.user_id.clone(),
            game_id: self.game_id.clone(),
            difficulty: self.difficulty.clone(),
        }
    }

    /// True if `self` would win the award for its key over `other`:
    /// earlier start, then lower insertion id.
    pub fn precedes(&self, other: &PlayEvent) -> bool {
        (self.started_at, self.id) < (other.started_at, other.id)
    }
}

/// Identity of an award: one per user, game and difficulty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AwardKey {
    pub user_id: String,
    pub game_id: String,
    pub difficulty: String,
}

/// The single counted play for an [`AwardKey`].
///
/// Only produced by deduplication, so holding one means the wrapped event
/// is the earliest play for its key in the history it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardedEvent {
    event: PlayEvent,
}

impl AwardedEvent {
    pub(crate) fn from_event(event: PlayEvent) -> Self {
        Self { event }
    }

    pub fn event(&self) -> &PlayEvent {
        &self.event
    }

    pub fn user_id(&self) -> &str {
        &self.event.user_id
    }

    pub fn score(&self) -> u64 {
        self.event.score
    }

    pub fn started_at(&self) -> i64 {
        self.event.started_at
    }

    pub fn key(&self) -> AwardKey {
        self.event.key()
    }
}

/// A user's total for one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScore {
    pub user: User,
    pub score: u64,
}

/// One row of a leaderboard page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: Option<String>,
    pub score: u64,
    /// Positional rank in the full ordering, 1-based; ties get distinct ranks.
    pub rank: u64,
}

/// A slice of the full ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardPage {
    pub window: Window,
    pub entries: Vec<LeaderboardEntry>,
    /// Number of registered users, scored or not.
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// A single user's standing, computed without reference to any page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfRank {
    pub user_id: String,
    pub username: Option<String>,
    pub score: u64,
    /// Count-rank: one plus the number of users with a strictly greater
    /// score. Tied users share a rank, unlike [`LeaderboardEntry::rank`].
    pub rank: u64,
}

/// Wire form of a leaderboard query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub window: Window,
    pub leaders: Vec<LeaderboardEntry>,
    pub me: Option<SelfRank>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl LeaderboardResponse {
    pub fn new(page: LeaderboardPage, me: Option<SelfRank>) -> Self {
        Self {
            window: page.window,
            leaders: page.entries,
            me,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
            has_prev: page.has_prev,
            has_next: page.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedes_orders_by_time_then_id() {
        let early = NewPlayEvent::new("u1", "g1", "easy", 10, 100).into_event(5);
        let late = NewPlayEvent::new("u1", "g1", "easy", 10, 200).into_event(1);
        let same_time_later_id = NewPlayEvent::new("u1", "g1", "easy", 3, 100).into_event(6);

        assert!(early.precedes(&late));
        assert!(!late.precedes(&early));
        assert!(early.precedes(&same_time_later_id));
        assert!(!early.precedes(&early));
    }

    #[test]
    fn test_response_wire_format() {
        let page = LeaderboardPage {
            window: Window::AllTime,
            entries: vec![LeaderboardEntry {
                user_id: "a".into(),
                username: None,
                score: 10,
                rank: 1,
            }],
            total: 1,
            limit: 50,
            offset: 0,
            has_prev: false,
            has_next: false,
        };
        let json = serde_json::to_value(LeaderboardResponse::new(page, None)).unwrap();

        assert_eq!(json["window"], "all");
        assert_eq!(json["leaders"][0]["userId"], "a");
        assert!(json["leaders"][0]["username"].is_null());
        assert!(json["me"].is_null());
        assert_eq!(json["hasPrev"], false);
        assert_eq!(json["hasNext"], false);
    }
}
