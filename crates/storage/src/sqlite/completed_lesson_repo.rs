use chrono::{DateTime, Utc};
use lingo_core::model::{LessonId, UserId};
use sqlx::Row;

use super::{SqliteRepository, mapping::lesson_id_from_str};
use crate::repository::{CompletedLessonRepository, StorageError};

#[async_trait::async_trait]
impl CompletedLessonRepository for SqliteRepository {
    async fn mark_completed(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO completed_lessons (user_id, lesson_id, completed_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id, lesson_id) DO NOTHING
            ",
        )
        .bind(user_id.as_str())
        .bind(lesson_id.as_str())
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected() == 1)
    }

    async fn completed_lessons(&self, user_id: &UserId) -> Result<Vec<LessonId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT lesson_id
                FROM completed_lessons
                WHERE user_id = ?1
                ORDER BY lesson_id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row
                .try_get("lesson_id")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            out.push(lesson_id_from_str(&raw)?);
        }
        Ok(out)
    }
}
