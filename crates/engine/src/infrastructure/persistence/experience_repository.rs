//! SQLite-backed experience storage.
//!
//! One row per experience; the structured state lives in a JSON column
//! and is replaced wholesale under a revision guard. The paid flag flips
//! through a conditional UPDATE so concurrent confirmations have exactly
//! one winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use giftwrap_domain::{Experience, ExperienceId, GameData};

use crate::infrastructure::ports::{ExperienceRepo, RepoError};

/// SQLite implementation of [`ExperienceRepo`].
pub struct SqliteExperienceRepo {
    pool: SqlitePool,
}

impl SqliteExperienceRepo {
    pub async fn new(db_path: &str) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Self::with_pool(pool).await
    }

    /// In-memory database for tests. Pinned to a single connection so
    /// every query sees the same database.
    pub async fn in_memory() -> Result<Self, RepoError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS experiences (
                id TEXT PRIMARY KEY,
                template_name TEXT NOT NULL,
                game_data TEXT NOT NULL,
                real_gift TEXT,
                is_paid INTEGER NOT NULL DEFAULT 0,
                recipient_email TEXT,
                revision INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                finalized_at TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(Self { pool })
    }

    async fn exists(&self, id: &ExperienceId) -> Result<bool, RepoError> {
        let row = sqlx::query("SELECT 1 FROM experiences WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl ExperienceRepo for SqliteExperienceRepo {
    async fn get(&self, id: ExperienceId) -> Result<Option<Experience>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT id, template_name, game_data, real_gift, is_paid,
                   recipient_email, revision, created_at, finalized_at
            FROM experiences WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(row_to_experience).transpose()
    }

    async fn insert(&self, experience: Experience) -> Result<(), RepoError> {
        let game_data = serde_json::to_string(&experience.game_data)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO experiences
                (id, template_name, game_data, real_gift, is_paid,
                 recipient_email, revision, created_at, finalized_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(experience.id.into_string())
        .bind(experience.template_name)
        .bind(game_data)
        .bind(experience.real_gift)
        .bind(experience.is_paid)
        .bind(experience.recipient_email)
        .bind(experience.revision)
        .bind(experience.created_at.to_rfc3339())
        .bind(experience.finalized_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn update_game_data(
        &self,
        id: ExperienceId,
        data: GameData,
        expected_revision: i64,
    ) -> Result<i64, RepoError> {
        let game_data =
            serde_json::to_string(&data).map_err(|e| RepoError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE experiences
            SET game_data = ?, revision = revision + 1
            WHERE id = ? AND revision = ?
            "#,
        )
        .bind(game_data)
        .bind(id.as_str())
        .bind(expected_revision)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(expected_revision + 1);
        }
        if self.exists(&id).await? {
            Err(RepoError::Conflict)
        } else {
            Err(RepoError::NotFound)
        }
    }

    async fn set_real_gift(
        &self,
        id: ExperienceId,
        real_gift: String,
        finalized_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE experiences
            SET real_gift = ?, finalized_at = COALESCE(finalized_at, ?)
            WHERE id = ?
            "#,
        )
        .bind(real_gift)
        .bind(finalized_at.to_rfc3339())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: ExperienceId,
        recipient_email: Option<String>,
    ) -> Result<bool, RepoError> {
        // Conditional update: the WHERE clause is the idempotency guard.
        let result = sqlx::query(
            r#"
            UPDATE experiences
            SET is_paid = 1, recipient_email = COALESCE(?, recipient_email)
            WHERE id = ? AND is_paid = 0
            "#,
        )
        .bind(recipient_email)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.exists(&id).await? {
            Ok(false)
        } else {
            Err(RepoError::NotFound)
        }
    }
}

fn row_to_experience(row: sqlx::sqlite::SqliteRow) -> Result<Experience, RepoError> {
    let game_data: String = row.get("game_data");
    let game_data: GameData =
        serde_json::from_str(&game_data).map_err(|e| RepoError::Serialization(e.to_string()))?;

    let created_at: String = row.get("created_at");
    let created_at = parse_timestamp(&created_at)?;
    let finalized_at: Option<String> = row.get("finalized_at");
    let finalized_at = finalized_at.as_deref().map(parse_timestamp).transpose()?;

    Ok(Experience {
        id: ExperienceId::from_string(row.get::<String, _>("id")),
        template_name: row.get("template_name"),
        game_data,
        real_gift: row.get("real_gift"),
        is_paid: row.get("is_paid"),
        recipient_email: row.get("recipient_email"),
        revision: row.get("revision"),
        created_at,
        finalized_at,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepoError::Serialization(e.to_string()))
}
