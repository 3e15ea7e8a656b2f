//! Query orchestration.
//!
//! One query is one snapshot read followed by a pure computation:
//! awards → window → aggregate → (rank & page, self rank). The computation
//! runs on the blocking pool. Dropping the caller's future trips a cancel
//! flag that the computation checks between stages.

use crate::aggregate::aggregate_scores;
use crate::error::{LadderError, Result};
use crate::query::LeaderboardQuery;
use crate::rank::RankedPopulation;
use crate::self_rank::resolve_self_rank;
use crate::storage::{EventStore, Snapshot};
use crate::types::LeaderboardResponse;
use crate::window::{now_millis, select_window};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, Instrument};

/// Leaderboard service over an event store.
#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn EventStore>,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Run a query against the current time.
    pub async fn query(&self, query: &LeaderboardQuery) -> Result<LeaderboardResponse> {
        self.query_at(query, now_millis()).await
    }

    /// Run a query with windows anchored at `now` (Unix milliseconds).
    pub async fn query_at(&self, query: &LeaderboardQuery, now: i64) -> Result<LeaderboardResponse> {
        let span = tracing::info_span!(
            "leaderboard.query",
            window = %query.window,
            limit = query.page.limit(),
            offset = query.page.offset(),
            self_rank = query.user_id.is_some(),
        );

        async move {
            let snapshot = self.store.snapshot().await?;
            let query = query.clone();
            let current = tracing::Span::current();
            let guard = CancelOnDrop::new();
            let cancel = guard.flag();

            tokio::task::spawn_blocking(move || {
                current.in_scope(|| compute_with_cancel(snapshot, &query, now, &cancel))
            })
            .await
            .map_err(|e| LadderError::task(e.to_string()))?
        }
        .instrument(span)
        .await
    }
}

/// Sets its flag when dropped, i.e. when the awaiting future goes away.
struct CancelOnDrop {
    flag: Arc<AtomicBool>,
}

impl CancelOnDrop {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

fn check_cancel(cancel: &AtomicBool, stage: &'static str) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        debug!(stage, "leaderboard query cancelled");
        return Err(LadderError::Cancelled);
    }
    Ok(())
}

/// Rank a snapshot. Pure; `now` anchors bounded windows.
pub fn compute_leaderboard(
    snapshot: Snapshot,
    query: &LeaderboardQuery,
    now: i64,
) -> Result<LeaderboardResponse> {
    compute_with_cancel(snapshot, query, now, &AtomicBool::new(false))
}

fn compute_with_cancel(
    snapshot: Snapshot,
    query: &LeaderboardQuery,
    now: i64,
    cancel: &AtomicBool,
) -> Result<LeaderboardResponse> {
    let Snapshot { users, history } = snapshot;

    check_cancel(cancel, "dedupe")?;
    let awards = history.into_awards();

    check_cancel(cancel, "window")?;
    let windowed = select_window(&awards, query.window, now);
    debug!(awards = awards.len(), windowed = windowed.len(), users = users.len(), "awards selected");

    check_cancel(cancel, "aggregate")?;
    let scores = aggregate_scores(windowed, &users)?;

    let me = query
        .user_id
        .as_deref()
        .and_then(|id| resolve_self_rank(&scores, id));
    if let (Some(id), None) = (query.user_id.as_deref(), me.as_ref()) {
        debug!(user_id = %id, "self rank requested for unregistered user");
    }

    check_cancel(cancel, "rank")?;
    let page = RankedPopulation::new(scores).page(query.window, query.page);
    Ok(LeaderboardResponse::new(page, me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{History, MemoryStore, StorageError};
    use crate::types::{NewPlayEvent, User};
    use crate::window::{Window, DAY_MS};
    use async_trait::async_trait;

    const NOW: i64 = 1_000 * DAY_MS;

    fn board(users: &[(&str, i64)], plays: &[(&str, &str, u64, i64)]) -> Leaderboard {
        let store = MemoryStore::new();
        for &(id, created_at) in users {
            store.register_user(User::new(id, created_at)).unwrap();
        }
        for &(user, game, score, started_at) in plays {
            store
                .record_event(NewPlayEvent::new(user, game, "easy", score, started_at))
                .unwrap();
        }
        Leaderboard::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_tie_break_diverges_from_self_rank() {
        let board = board(
            &[("A", 1), ("B", 2)],
            &[("A", "game1", 10, NOW - 3), ("A", "game1", 5, NOW - 2), ("B", "game1", 10, NOW - 1)],
        );

        let query = LeaderboardQuery::new(Window::AllTime).with_user("B");
        let resp = board.query_at(&query, NOW).await.unwrap();

        let page: Vec<(&str, u64, u64)> = resp
            .leaders
            .iter()
            .map(|e| (e.user_id.as_str(), e.score, e.rank))
            .collect();
        assert_eq!(page, vec![("A", 10, 1), ("B", 10, 2)]);

        let me = resp.me.unwrap();
        assert_eq!(me.score, 10);
        assert_eq!(me.rank, 1);
    }

    #[tokio::test]
    async fn test_week_ignores_replay_of_old_award() {
        let board = board(
            &[("A", 1)],
            &[("A", "game1", 40, NOW - 10 * DAY_MS), ("A", "game1", 90, NOW - DAY_MS)],
        );

        let query = LeaderboardQuery::new(Window::Week).with_user("A");
        let resp = board.query_at(&query, NOW).await.unwrap();
        assert_eq!(resp.leaders[0].score, 0);
        assert_eq!(resp.me.unwrap().score, 0);

        let resp = board.query_at(&LeaderboardQuery::new(Window::AllTime), NOW).await.unwrap();
        assert_eq!(resp.leaders[0].score, 40);
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_self_rank() {
        let board = board(&[("A", 1)], &[]);
        let query = LeaderboardQuery::new(Window::AllTime).with_user("ghost");
        let resp = board.query_at(&query, NOW).await.unwrap();

        assert!(resp.me.is_none());
        assert_eq!(resp.total, 1);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let board = board(&[], &[]);
        let resp = board.query_at(&LeaderboardQuery::default(), NOW).await.unwrap();

        assert!(resp.leaders.is_empty());
        assert_eq!(resp.total, 0);
        assert!(!resp.has_prev);
        assert!(!resp.has_next);
        assert_eq!(resp.limit, 50);
        assert_eq!(resp.offset, 0);
    }

    struct FailingStore;

    #[async_trait]
    impl EventStore for FailingStore {
        async fn snapshot(&self) -> crate::storage::Result<Snapshot> {
            Err(StorageError::Backend("connection refused".into()))
        }

        async fn user_count(&self) -> crate::storage::Result<u64> {
            Err(StorageError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let board = Leaderboard::new(Arc::new(FailingStore));
        let err = board.query_at(&LeaderboardQuery::default(), NOW).await.unwrap_err();
        assert!(matches!(err, LadderError::Storage(StorageError::Backend(_))));
    }

    #[test]
    fn test_compute_from_raw_events() {
        let snapshot = Snapshot {
            users: vec![User::new("a", 1), User::new("b", 2), User::new("c", 3)],
            history: History::Events(vec![
                NewPlayEvent::new("c", "g1", "easy", 5, NOW - 1).into_event(1),
                NewPlayEvent::new("b", "g1", "easy", 9, NOW - 1).into_event(2),
                NewPlayEvent::new("b", "g1", "easy", 9, NOW).into_event(3),
            ]),
        };
        let query = LeaderboardQuery::new(Window::Day).with_page(2, 0);
        let resp = compute_leaderboard(snapshot, &query, NOW).unwrap();

        let ids: Vec<&str> = resp.leaders.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(resp.leaders[0].score, 9);
        assert!(resp.has_next);
        assert_eq!(resp.total, 3);
    }

    fn snapshot_of(users: &[&str]) -> Snapshot {
        Snapshot {
            users: users.iter().map(|&id| User::new(id, 1)).collect(),
            history: History::Events(vec![]),
        }
    }

    #[test]
    fn test_cancelled_computation_stops() {
        let query = LeaderboardQuery::default();

        let cancelled = AtomicBool::new(true);
        let err = compute_with_cancel(snapshot_of(&["a"]), &query, NOW, &cancelled).unwrap_err();
        assert!(matches!(err, LadderError::Cancelled));

        let live = AtomicBool::new(false);
        assert!(compute_with_cancel(snapshot_of(&["a"]), &query, NOW, &live).is_ok());
    }

    #[test]
    fn test_dropping_guard_trips_flag() {
        let guard = CancelOnDrop::new();
        let flag = guard.flag();
        assert!(!flag.load(Ordering::Relaxed));

        drop(guard);
        assert!(flag.load(Ordering::Relaxed));
    }

    /// Store whose snapshot parks until released, so the query can be
    /// abandoned mid-flight.
    struct GatedStore {
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl EventStore for GatedStore {
        async fn snapshot(&self) -> crate::storage::Result<Snapshot> {
            self.gate.notified().await;
            Ok(snapshot_of(&["a"]))
        }

        async fn user_count(&self) -> crate::storage::Result<u64> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_abandoned_query_can_be_dropped() {
        let store = Arc::new(GatedStore {
            gate: tokio::sync::Notify::new(),
        });
        let board = Leaderboard::new(store.clone());
        let query = LeaderboardQuery::default();

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            board.query_at(&query, NOW),
        )
        .await;
        assert!(abandoned.is_err());

        store.gate.notify_one();
        let resp = board.query_at(&query, NOW).await.unwrap();
        assert_eq!(resp.total, 1);
    }
}
