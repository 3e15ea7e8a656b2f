//! Ordering, positional ranks and paging.

use crate::types::{LeaderboardEntry, LeaderboardPage, UserScore};
use crate::window::Window;
use std::cmp::Ordering;

/// Page size used when none (or an invalid one) is requested.
pub const DEFAULT_LIMIT: usize = 50;
/// Largest page a caller can ask for.
pub const MAX_LIMIT: usize = 1000;

/// A validated page selector. `limit` is always within `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: usize,
    offset: usize,
}

impl PageRequest {
    /// Zero limit falls back to the default, oversized limits are clamped.
    pub fn new(limit: usize, offset: usize) -> Self {
        let limit = match limit {
            0 => DEFAULT_LIMIT,
            l => l.min(MAX_LIMIT),
        };
        Self { limit, offset }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }
}

/// Canonical page order: score descending, then earlier registration,
/// then user id so the order is total.
pub fn compare_standing(a: &UserScore, b: &UserScore) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.user.created_at.cmp(&b.user.created_at))
        .then_with(|| a.user.user_id.cmp(&b.user.user_id))
}

/// The full population in page order.
#[derive(Debug, Clone)]
pub struct RankedPopulation {
    ordered: Vec<UserScore>,
}

impl RankedPopulation {
    pub fn new(mut scores: Vec<UserScore>) -> Self {
        scores.sort_by(compare_standing);
        Self { ordered: scores }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn scores(&self) -> &[UserScore] {
        &self.ordered
    }

    /// Positional rank of a user in the full ordering.
    pub fn position_of(&self, user_id: &str) -> Option<u64> {
        self.ordered
            .iter()
            .position(|s| s.user.user_id == user_id)
            .map(|i| i as u64 + 1)
    }

    /// Entries `[offset, offset + limit)` of the full ordering.
    pub fn page(&self, window: Window, request: PageRequest) -> LeaderboardPage {
        let total = self.ordered.len();
        let entries: Vec<LeaderboardEntry> = self
            .ordered
            .iter()
            .enumerate()
            .skip(request.offset())
            .take(request.limit())
            .map(|(i, s)| LeaderboardEntry {
                user_id: s.user.user_id.clone(),
                username: s.user.username.clone(),
                score: s.score,
                rank: i as u64 + 1,
            })
            .collect();

        let has_next = request.offset().saturating_add(entries.len()) < total;

        LeaderboardPage {
            window,
            entries,
            total: total as u64,
            limit: request.limit(),
            offset: request.offset(),
            has_prev: request.offset() > 0,
            has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;

    fn score(id: &str, created_at: i64, score: u64) -> UserScore {
        UserScore {
            user: User::new(id, created_at),
            score,
        }
    }

    fn population() -> RankedPopulation {
        RankedPopulation::new(vec![
            score("late", 30, 10),
            score("zero", 5, 0),
            score("top", 20, 99),
            score("early", 10, 10),
            score("mid", 1, 7),
        ])
    }

    #[test]
    fn test_page_request_clamping() {
        assert_eq!(PageRequest::new(0, 0).limit(), DEFAULT_LIMIT);
        assert_eq!(PageRequest::new(5000, 0).limit(), MAX_LIMIT);
        assert_eq!(PageRequest::new(1, 3).limit(), 1);
        assert_eq!(PageRequest::default(), PageRequest::new(50, 0));
    }

    #[test]
    fn test_order_and_tie_break() {
        let ranked = population();
        let ids: Vec<&str> = ranked.scores().iter().map(|s| s.user.user_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "early", "late", "mid", "zero"]);
    }

    #[test]
    fn test_same_score_same_registration_falls_back_to_id() {
        let ranked = RankedPopulation::new(vec![score("b", 1, 5), score("a", 1, 5)]);
        assert_eq!(ranked.position_of("a"), Some(1));
        assert_eq!(ranked.position_of("b"), Some(2));
    }

    #[test]
    fn test_ranks_are_positional_and_continue_across_pages() {
        let ranked = population();
        let page = ranked.page(Window::AllTime, PageRequest::new(2, 1));

        let ranks: Vec<u64> = page.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![2, 3]);
        assert_eq!(page.entries[0].score, page.entries[1].score);
        assert_eq!(page.total, 5);
        assert!(page.has_prev);
        assert!(page.has_next);
    }

    #[test]
    fn test_last_page() {
        let page = population().page(Window::AllTime, PageRequest::new(2, 4));
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].rank, 5);
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn test_offset_past_end() {
        let page = population().page(Window::Week, PageRequest::new(10, 50));
        assert!(page.entries.is_empty());
        assert_eq!(page.total, 5);
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn test_empty_population() {
        let page = RankedPopulation::new(vec![]).page(Window::AllTime, PageRequest::default());
        assert!(page.entries.is_empty());
        assert_eq!(page.total, 0);
        assert!(!page.has_prev);
        assert!(!page.has_next);
    }
}
