use lingo_core::model::UserId;

use super::{SqliteRepository, mapping::map_quiz_score_row};
use crate::repository::{QuizScoreRecord, QuizScoreRepository, StorageError};

#[async_trait::async_trait]
impl QuizScoreRepository for SqliteRepository {
    async fn append_score(&self, record: QuizScoreRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_scores (
                    user_id, lesson_id, score, total_questions, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(record.user_id.as_str())
        .bind(record.lesson_id.as_str())
        .bind(i64::from(record.score))
        .bind(i64::from(record.total_questions))
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn scores_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<QuizScoreRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, lesson_id, score, total_questions, completed_at
                FROM quiz_scores
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_quiz_score_row(&row)?);
        }
        Ok(out)
    }
}
