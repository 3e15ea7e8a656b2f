//! In-memory event store.

use super::{EventStore, History, Result, SeedData, Snapshot, StorageError};
use crate::award::{AwardChange, AwardIndex};
use crate::types::{NewPlayEvent, PlayEvent, User};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory store for development and tests.
///
/// Keeps the raw event log and an [`AwardIndex`] updated on every append, so
/// snapshots hand out awards without rescanning history.
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    /// user_id -> position in `users`
    user_index: HashMap<String, usize>,
    events: Vec<PlayEvent>,
    awards: AwardIndex,
    next_event_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_event_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Build a store from seed data: users first, then events in order.
    pub fn from_seed(seed: SeedData) -> crate::Result<Self> {
        let store = Self::new();
        for user in seed.users {
            store.register_user(user)?;
        }
        for event in seed.events {
            store.record_event(event)?;
        }
        Ok(store)
    }

    pub fn register_user(&self, user: User) -> Result<()> {
        let mut state = self.state.write();
        if state.user_index.contains_key(&user.user_id) {
            return Err(StorageError::DuplicateUser(user.user_id));
        }

        let position = state.users.len();
        state.user_index.insert(user.user_id.clone(), position);
        state.users.push(user);
        Ok(())
    }

    /// Append a play event, assigning the next insertion id.
    pub fn record_event(&self, event: NewPlayEvent) -> crate::Result<PlayEvent> {
        let mut state = self.state.write();
        if !state.user_index.contains_key(&event.user_id) {
            return Err(StorageError::UnknownUser(event.user_id).into());
        }

        let event = event.into_event(state.next_event_id);
        let change = state.awards.observe(&event);
        if let AwardChange::Replaced { previous_score } = change {
            tracing::debug!(
                user_id = %event.user_id,
                game_id = %event.game_id,
                previous_score,
                "back-dated play replaced award"
            );
        }

        state.next_event_id += 1;
        state.events.push(event.clone());
        Ok(event)
    }

    pub fn user(&self, user_id: &str) -> Option<User> {
        let state = self.state.read();
        state
            .user_index
            .get(user_id)
            .map(|&i| state.users[i].clone())
    }

    /// All-time score straight from the running totals.
    pub fn all_time_total(&self, user_id: &str) -> crate::Result<u64> {
        self.state.read().awards.all_time_total(user_id)
    }

    /// Copy of the raw event log, in insertion order.
    pub fn events(&self) -> Vec<PlayEvent> {
        self.state.read().events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.state.read().events.len()
    }

    pub fn award_count(&self) -> usize {
        self.state.read().awards.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn snapshot(&self) -> Result<Snapshot> {
        let state = self.state.read();
        Ok(Snapshot {
            users: state.users.clone(),
            history: History::Awards(state.awards.awards()),
        })
    }

    async fn user_count(&self) -> Result<u64> {
        Ok(self.state.read().users.len() as u64)
    }
}
