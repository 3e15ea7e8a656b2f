//! Award deduplication.
//!
//! Only the first play of a (user, game, difficulty) is ever awarded. Two
//! forms are provided:
//!
//! - [`dedupe_awards`]: batch, over a full event history
//! - [`AwardIndex`]: incremental, updated once per incoming event, with a
//!   running all-time total per user
//!
//! Both pick the earliest `started_at`, breaking ties on insertion id, so the
//! result does not depend on the order events arrive in.

use crate::error::{LadderError, Result};
use crate::types::{AwardKey, AwardedEvent, PlayEvent};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Reduce a history to one award per key, sorted by key.
pub fn dedupe_awards<'a, I>(events: I) -> Vec<AwardedEvent>
where
    I: IntoIterator<Item = &'a PlayEvent>,
{
    let mut first: BTreeMap<AwardKey, &PlayEvent> = BTreeMap::new();

    for event in events {
        match first.entry(event.key()) {
            Entry::Vacant(slot) => {
                slot.insert(event);
            }
            Entry::Occupied(mut slot) => {
                if event.precedes(slot.get()) {
                    slot.insert(event);
                }
            }
        }
    }

    first
        .into_values()
        .map(|event| AwardedEvent::from_event(event.clone()))
        .collect()
}

/// What observing an event did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardChange {
    /// First play seen for its key.
    Inserted,
    /// A back-dated play displaced the previous award.
    Replaced { previous_score: u64 },
    /// A replay; the existing award stands.
    Unchanged,
}

/// Incrementally maintained first-award index.
#[derive(Debug, Clone, Default)]
pub struct AwardIndex {
    awards: BTreeMap<AwardKey, AwardedEvent>,
    /// All-time award sum per user. Wider than a score so that no sequence
    /// of `u64` awards can wrap it; the `u64` bound is enforced on read.
    totals: HashMap<String, u128>,
}

impl AwardIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a PlayEvent>,
    {
        let mut index = Self::new();
        for event in events {
            index.observe(event);
        }
        index
    }

    /// Fold one event into the index.
    ///
    /// Never rejects an event: the award set always equals [`dedupe_awards`]
    /// over everything observed. Overflow only surfaces when a total is read.
    pub fn observe(&mut self, event: &PlayEvent) -> AwardChange {
        let change = match self.awards.get(&event.key()) {
            None => AwardChange::Inserted,
            Some(existing) if event.precedes(existing.event()) => AwardChange::Replaced {
                previous_score: existing.score(),
            },
            Some(_) => return AwardChange::Unchanged,
        };

        let total = self.totals.entry(event.user_id.clone()).or_default();
        if let AwardChange::Replaced { previous_score } = change {
            *total -= u128::from(previous_score);
        }
        *total += u128::from(event.score);

        self.awards.insert(event.key(), AwardedEvent::from_event(event.clone()));
        change
    }

    /// Current awards, sorted by key.
    pub fn awards(&self) -> Vec<AwardedEvent> {
        self.awards.values().cloned().collect()
    }

    /// All-time score for a user; 0 if they have no awards.
    pub fn all_time_total(&self, user_id: &str) -> Result<u64> {
        let total = self.totals.get(user_id).copied().unwrap_or(0);
        u64::try_from(total).map_err(|_| LadderError::score_overflow(user_id))
    }

    pub fn len(&self) -> usize {
        self.awards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.awards.is_empty()
    }
}
