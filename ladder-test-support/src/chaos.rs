//! Arrival-order chaos for play events.
//!
//! Award selection must not care how events reach a store: shuffled,
//! re-delivered, or both. `ArrivalChaos` produces such deliveries.

use ladder::PlayEvent;
use rand::seq::SliceRandom;
use rand::Rng;

/// Scrambles a history into an alternative delivery order.
///
/// # Example
///
/// ```
/// use ladder_test_support::{ArrivalChaos, Fixture};
///
/// let events = Fixture::new().user("a", 1).play("a", "g", "easy", 1, 1).events();
/// let mut chaos = ArrivalChaos::new().with_duplicate_probability(0.5);
/// let delivered = chaos.scramble(&events);
/// assert!(delivered.len() >= events.len());
/// ```
pub struct ArrivalChaos {
    shuffle: bool,
    duplicate_probability: f64,
    rng: rand::rngs::ThreadRng,
    duplicates_injected: usize,
}

impl Default for ArrivalChaos {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrivalChaos {
    /// Shuffles, never duplicates.
    pub fn new() -> Self {
        Self {
            shuffle: true,
            duplicate_probability: 0.0,
            rng: rand::thread_rng(),
            duplicates_injected: 0,
        }
    }

    /// Shuffle and re-deliver roughly a quarter of events.
    pub fn aggressive() -> Self {
        Self::new().with_duplicate_probability(0.25)
    }

    pub fn with_duplicate_probability(mut self, prob: f64) -> Self {
        self.duplicate_probability = prob.clamp(0.0, 1.0);
        self
    }

    /// Keep the original order (duplicates are still appended in place).
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Produce a delivery of `events`. Duplicates are exact copies, same id.
    pub fn scramble(&mut self, events: &[PlayEvent]) -> Vec<PlayEvent> {
        let mut delivered = Vec::with_capacity(events.len());
        for event in events {
            delivered.push(event.clone());
            if self.rng.gen::<f64>() < self.duplicate_probability {
                delivered.push(event.clone());
                self.duplicates_injected += 1;
            }
        }

        if self.shuffle {
            delivered.shuffle(&mut self.rng);
        }
        delivered
    }

    /// Reversed delivery: newest first.
    pub fn reversed(events: &[PlayEvent]) -> Vec<PlayEvent> {
        events.iter().rev().cloned().collect()
    }

    pub fn duplicates_injected(&self) -> usize {
        self.duplicates_injected
    }
}
