use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies pending schema migrations.
///
/// Version 1 creates `user_progress`, `completed_lessons` and `quiz_scores`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: progress schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_progress (
                    user_id TEXT PRIMARY KEY NOT NULL CHECK (length(user_id) > 0),
                    current_week INTEGER NOT NULL DEFAULT 1 CHECK (current_week >= 1),
                    current_day INTEGER NOT NULL DEFAULT 1 CHECK (current_day >= 1),
                    streak INTEGER NOT NULL DEFAULT 0 CHECK (streak >= 0),
                    last_activity_date TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS completed_lessons (
                    user_id TEXT NOT NULL,
                    lesson_id TEXT NOT NULL CHECK (length(lesson_id) > 0),
                    completed_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, lesson_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_scores (
                    id INTEGER PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    lesson_id TEXT NOT NULL,
                    score INTEGER NOT NULL CHECK (score >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions > 0),
                    completed_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_quiz_scores_user_completed
                    ON quiz_scores (user_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
