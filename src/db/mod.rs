// Snapshot store (SQLite via sqlx).
//
// The whole tournament lives in one JSON document guarded by a version counter.
// Writers pass the version they read; a stale version is rejected.

use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::StoreError;
use crate::model::TournamentState;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SnapshotRow {
    version: i64,
    body: String,
    updated_at: String,
}

/// A loaded tournament snapshot and the version it was read at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub version: i64,
    pub updated_at: String,
    pub state: TournamentState,
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = StoreError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        Ok(Snapshot {
            version: row.version,
            updated_at: row.updated_at,
            state: serde_json::from_str(&row.body)?,
        })
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        // Each connection to an in-memory database gets its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tournament_snapshot (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_snapshot(&self) -> Result<Option<Snapshot>, StoreError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT version, body, updated_at FROM tournament_snapshot WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(Snapshot::try_from).transpose()
    }

    /// Insert the initial snapshot at version 1. If one already exists it is
    /// returned unchanged.
    pub async fn create_snapshot(&self, state: &TournamentState) -> Result<Snapshot, StoreError> {
        let body = serde_json::to_string(state)?;
        let inserted = sqlx::query(
            "INSERT INTO tournament_snapshot (id, version, body) VALUES (1, 1, ?) ON CONFLICT(id) DO NOTHING",
        )
        .bind(&body)
        .execute(&self.pool)
        .await?;
        if inserted.rows_affected() > 0 {
            tracing::info!("Tournament snapshot created");
        }
        self.load_snapshot().await?.ok_or(StoreError::Missing)
    }

    /// Write `state` if the stored version still equals `expected_version`.
    /// Returns the new version.
    pub async fn save_snapshot(
        &self,
        state: &TournamentState,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let body = serde_json::to_string(state)?;
        let result = sqlx::query(
            "UPDATE tournament_snapshot SET version = version + 1, body = ?, updated_at = datetime('now') WHERE id = 1 AND version = ?",
        )
        .bind(&body)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.load_snapshot().await? {
                Some(_) => Err(StoreError::VersionConflict {
                    expected: expected_version,
                }),
                None => Err(StoreError::Missing),
            };
        }
        Ok(expected_version + 1)
    }

    /// Replace the stored snapshot regardless of its version.
    pub async fn reset_snapshot(&self, state: &TournamentState) -> Result<Snapshot, StoreError> {
        let body = serde_json::to_string(state)?;
        sqlx::query(
            r#"
            INSERT INTO tournament_snapshot (id, version, body) VALUES (1, 1, ?)
            ON CONFLICT(id) DO UPDATE SET
                version = tournament_snapshot.version + 1,
                body = excluded.body,
                updated_at = datetime('now')
            "#,
        )
        .bind(&body)
        .execute(&self.pool)
        .await?;
        self.load_snapshot().await?.ok_or(StoreError::Missing)
    }
}
