//! Brute-force reference leaderboard.
//!
//! Every number here is computed straight from the definitions with
//! quadratic scans, no indexes and no shared code paths with the engine
//! beyond the data types. Use it to check responses on random histories.

use ladder::{LeaderboardQuery, LeaderboardResponse, PlayEvent, User, Window};
use std::fmt;

/// Expected standing of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub user_id: String,
    pub score: u64,
}

/// A single mismatch between a response and the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    Total { expected: u64, actual: u64 },
    PageLength { expected: usize, actual: usize },
    Entry { position: u64, expected: Standing, actual: Standing },
    Rank { user_id: String, expected: u64, actual: u64 },
    Flags { expected: (bool, bool), actual: (bool, bool) },
    SelfRank { expected: Option<(u64, u64)>, actual: Option<(u64, u64)> },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::Total { expected, actual } => {
                write!(f, "total: expected {expected}, got {actual}")
            }
            Discrepancy::PageLength { expected, actual } => {
                write!(f, "page length: expected {expected}, got {actual}")
            }
            Discrepancy::Entry { position, expected, actual } => write!(
                f,
                "position {position}: expected {}={}, got {}={}",
                expected.user_id, expected.score, actual.user_id, actual.score
            ),
            Discrepancy::Rank { user_id, expected, actual } => {
                write!(f, "rank of {user_id}: expected {expected}, got {actual}")
            }
            Discrepancy::Flags { expected, actual } => {
                write!(f, "(hasPrev, hasNext): expected {expected:?}, got {actual:?}")
            }
            Discrepancy::SelfRank { expected, actual } => {
                write!(f, "me (score, rank): expected {expected:?}, got {actual:?}")
            }
        }
    }
}

/// Reference board over a fixed history.
///
/// `events` must be unique by id; pass the history, not a delivery with
/// re-sent copies.
pub struct ReferenceBoard<'a> {
    users: &'a [User],
    events: &'a [PlayEvent],
}

impl<'a> ReferenceBoard<'a> {
    pub fn new(users: &'a [User], events: &'a [PlayEvent]) -> Self {
        Self { users, events }
    }

    /// An event is the award for its key when nothing with the same key
    /// started before it (ties go to the lower id).
    pub fn is_award(&self, event: &PlayEvent) -> bool {
        !self.events.iter().any(|other| {
            other.user_id == event.user_id
                && other.game_id == event.game_id
                && other.difficulty == event.difficulty
                && (other.started_at, other.id) < (event.started_at, event.id)
        })
    }

    /// Sum of a user's awards that started inside the window.
    pub fn score(&self, user_id: &str, window: Window, now: i64) -> u64 {
        self.events
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| self.is_award(e))
            .filter(|e| match window.since(now) {
                Some(since) => e.started_at >= since,
                None => true,
            })
            .map(|e| e.score)
            .sum()
    }

    /// Every registered user in page order.
    pub fn standings(&self, window: Window, now: i64) -> Vec<Standing> {
        let mut rows: Vec<(&User, u64)> = self
            .users
            .iter()
            .map(|u| (u, self.score(&u.user_id, window, now)))
            .collect();

        rows.sort_by(|(a, sa), (b, sb)| {
            sb.cmp(sa)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.user_id.cmp(&b.user_id))
        });

        rows.into_iter()
            .map(|(u, score)| Standing {
                user_id: u.user_id.clone(),
                score,
            })
            .collect()
    }

    /// `(score, 1 + users strictly ahead)` for a registered user.
    pub fn self_rank(&self, user_id: &str, window: Window, now: i64) -> Option<(u64, u64)> {
        self.users.iter().find(|u| u.user_id == user_id)?;
        let mine = self.score(user_id, window, now);
        let ahead = self
            .users
            .iter()
            .filter(|u| self.score(&u.user_id, window, now) > mine)
            .count() as u64;
        Some((mine, ahead + 1))
    }

    /// Compare a response against the reference. Empty means it matches.
    pub fn verify(
        &self,
        query: &LeaderboardQuery,
        response: &LeaderboardResponse,
        now: i64,
    ) -> Vec<Discrepancy> {
        let mut found = Vec::new();
        let standings = self.standings(query.window, now);
        let offset = query.page.offset();
        let limit = query.page.limit();

        if response.total != standings.len() as u64 {
            found.push(Discrepancy::Total {
                expected: standings.len() as u64,
                actual: response.total,
            });
        }

        let expected_page: Vec<&Standing> = standings.iter().skip(offset).take(limit).collect();
        if response.leaders.len() != expected_page.len() {
            found.push(Discrepancy::PageLength {
                expected: expected_page.len(),
                actual: response.leaders.len(),
            });
        }

        for (i, (expected, entry)) in expected_page.iter().zip(&response.leaders).enumerate() {
            let position = (offset + i) as u64 + 1;
            if expected.user_id != entry.user_id || expected.score != entry.score {
                found.push(Discrepancy::Entry {
                    position,
                    expected: (*expected).clone(),
                    actual: Standing {
                        user_id: entry.user_id.clone(),
                        score: entry.score,
                    },
                });
            }
            if entry.rank != position {
                found.push(Discrepancy::Rank {
                    user_id: entry.user_id.clone(),
                    expected: position,
                    actual: entry.rank,
                });
            }
        }

        let flags = (offset > 0, offset + expected_page.len() < standings.len());
        let actual_flags = (response.has_prev, response.has_next);
        if flags != actual_flags {
            found.push(Discrepancy::Flags {
                expected: flags,
                actual: actual_flags,
            });
        }

        let expected_me = query
            .user_id
            .as_deref()
            .and_then(|id| self.self_rank(id, query.window, now));
        let actual_me = response.me.as_ref().map(|m| (m.score, m.rank));
        if expected_me != actual_me {
            found.push(Discrepancy::SelfRank {
                expected: expected_me,
                actual: actual_me,
            });
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fixture;

    #[test]
    fn test_reference_award_rules() {
        let fixture = Fixture::new()
            .user("a", 1)
            .play("a", "g", "easy", 10, 200)
            .play("a", "g", "easy", 99, 100)
            .play("a", "g", "hard", 5, 100);
        let events = fixture.events();
        let board = ReferenceBoard::new(fixture.users(), &events);

        assert!(!board.is_award(&events[0]));
        assert!(board.is_award(&events[1]));
        assert_eq!(board.score("a", Window::AllTime, 1_000), 104);
    }

    #[test]
    fn test_reference_self_rank_counts_strictly_ahead() {
        let fixture = Fixture::new()
            .user("a", 1)
            .user("b", 2)
            .user("c", 3)
            .play("a", "g", "easy", 10, 10)
            .play("b", "g", "easy", 10, 10);
        let events = fixture.events();
        let board = ReferenceBoard::new(fixture.users(), &events);

        assert_eq!(board.self_rank("b", Window::AllTime, 100), Some((10, 1)));
        assert_eq!(board.self_rank("c", Window::AllTime, 100), Some((0, 3)));
        assert_eq!(board.self_rank("nobody", Window::AllTime, 100), None);
    }
}
