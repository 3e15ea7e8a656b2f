//! PostgreSQL event store.
//!
//! Enable with the `postgres` feature flag:
//! ```toml
//! ladder = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! Snapshots are read inside one `REPEATABLE READ, READ ONLY` transaction so
//! the user list and the session history come from the same database state.

use super::{EventStore, History, Result, Snapshot, StorageError};
use crate::types::{NewPlayEvent, PlayEvent, User};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS game_sessions (
    id BIGSERIAL PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    game_id TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    score BIGINT NOT NULL CHECK (score >= 0),
    started_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_award_key
    ON game_sessions(user_id, game_id, difficulty, started_at);
"#;

/// PostgreSQL-backed store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store with a fresh connection pool.
    pub async fn connect(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create with existing pool.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if missing.
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, created_at) VALUES ($1, $2, to_timestamp($3::double precision / 1000.0))",
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    pub async fn insert_event(&self, event: NewPlayEvent) -> Result<PlayEvent> {
        let score = i64::try_from(event.score)
            .map_err(|_| StorageError::CorruptRow(format!("score {} exceeds BIGINT", event.score)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO game_sessions (user_id, game_id, difficulty, score, started_at)
            VALUES ($1, $2, $3, $4, to_timestamp($5::double precision / 1000.0))
            RETURNING id
            "#,
        )
        .bind(&event.user_id)
        .bind(&event.game_id)
        .bind(&event.difficulty)
        .bind(score)
        .bind(event.started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        let id: i64 = row.try_get("id").map_err(backend)?;
        Ok(event.into_event(id as u64))
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn snapshot(&self) -> Result<Snapshot> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let user_rows = sqlx::query(
            r#"
            SELECT id, username,
                   (EXTRACT(EPOCH FROM created_at) * 1000)::bigint AS created_at
            FROM users
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        let event_rows = sqlx::query(
            r#"
            SELECT id, user_id, game_id, difficulty, score,
                   (EXTRACT(EPOCH FROM started_at) * 1000)::bigint AS started_at
            FROM game_sessions
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        let users = user_rows.iter().map(user_from_row).collect::<Result<Vec<_>>>()?;
        let events = event_rows.iter().map(event_from_row).collect::<Result<Vec<_>>>()?;

        tracing::debug!(users = users.len(), events = events.len(), "postgres snapshot");

        Ok(Snapshot {
            users,
            history: History::Events(events),
        })
    }

    async fn user_count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        let count: i64 = row.try_get("cnt").map_err(backend)?;
        Ok(count as u64)
    }
}

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        user_id: row.try_get("id").map_err(backend)?,
        username: row.try_get("username").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
    })
}

fn event_from_row(row: &PgRow) -> Result<PlayEvent> {
    let id: i64 = row.try_get("id").map_err(backend)?;
    let score: i64 = row.try_get("score").map_err(backend)?;
    let score = u64::try_from(score)
        .map_err(|_| StorageError::CorruptRow(format!("negative score in session {id}")))?;

    Ok(PlayEvent {
        id: id as u64,
        user_id: row.try_get("user_id").map_err(backend)?,
        game_id: row.try_get("game_id").map_err(backend)?,
        difficulty: row.try_get("difficulty").map_err(backend)?,
        score,
        started_at: row.try_get("started_at").map_err(backend)?,
    })
}
