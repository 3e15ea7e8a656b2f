//! History fixtures.

use ladder::{MemoryStore, NewPlayEvent, PlayEvent, SeedData, User};
use rand::Rng;

/// Hand-built history of users and plays.
///
/// # Example
///
/// ```
/// use ladder_test_support::Fixture;
///
/// let fixture = Fixture::new()
///     .user("a", 1)
///     .play("a", "game1", "easy", 10, 100);
///
/// let store = fixture.store();
/// assert_eq!(store.event_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    users: Vec<User>,
    plays: Vec<NewPlayEvent>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: &str, created_at: i64) -> Self {
        self.users.push(User::new(user_id, created_at));
        self
    }

    pub fn named_user(mut self, user_id: &str, username: &str, created_at: i64) -> Self {
        self.users.push(User::new(user_id, created_at).with_username(username));
        self
    }

    pub fn play(
        mut self,
        user_id: &str,
        game_id: &str,
        difficulty: &str,
        score: u64,
        started_at: i64,
    ) -> Self {
        self.plays
            .push(NewPlayEvent::new(user_id, game_id, difficulty, score, started_at));
        self
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Plays with the ids a fresh store would assign (1, 2, ...).
    pub fn events(&self) -> Vec<PlayEvent> {
        self.plays
            .iter()
            .cloned()
            .zip(1u64..)
            .map(|(play, id)| play.into_event(id))
            .collect()
    }

    pub fn seed(&self) -> SeedData {
        SeedData {
            users: self.users.clone(),
            events: self.plays.clone(),
        }
    }

    /// Memory store holding this history.
    ///
    /// Panics if the fixture references unregistered users.
    pub fn store(&self) -> MemoryStore {
        MemoryStore::from_seed(self.seed()).expect("fixture must be a valid seed")
    }

    /// Random history within the bounds of `shape`.
    pub fn random(shape: &RandomHistory) -> Self {
        let mut rng = rand::thread_rng();
        let mut fixture = Self::new();

        for i in 0..shape.users {
            // Small registration range so created_at ties happen
            let created_at = rng.gen_range(0..=shape.users as i64 / 2);
            fixture = fixture.user(&format!("user{i}"), created_at);
        }

        if shape.users == 0 {
            return fixture;
        }

        for _ in 0..shape.plays {
            let user = format!("user{}", rng.gen_range(0..shape.users));
            let game = format!("game{}", rng.gen_range(0..shape.games.max(1)));
            let difficulty = DIFFICULTIES[rng.gen_range(0..DIFFICULTIES.len())];
            let score = rng.gen_range(0..=shape.max_score);
            let started_at = shape.now - rng.gen_range(0..=shape.span_ms);
            fixture = fixture.play(&user, &game, difficulty, score, started_at);
        }

        fixture
    }
}

const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

/// Bounds for [`Fixture::random`].
#[derive(Debug, Clone)]
pub struct RandomHistory {
    pub users: usize,
    pub games: usize,
    pub plays: usize,
    pub max_score: u64,
    /// Plays start somewhere in `[now - span_ms, now]`.
    pub span_ms: i64,
    pub now: i64,
}

impl Default for RandomHistory {
    fn default() -> Self {
        Self {
            users: 20,
            games: 4,
            plays: 300,
            max_score: 20,
            span_ms: 45 * 24 * 60 * 60 * 1000,
            now: 1_700_000_000_000,
        }
    }
}
