use lingo_core::model::UserId;
use lingo_core::streak::StreakStamp;

use super::{
    SqliteRepository,
    mapping::{map_progress_row, write_error},
};
use crate::repository::{StorageError, UserProgressRecord, UserProgressRepository};

#[async_trait::async_trait]
impl UserProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, current_week, current_day, streak, last_activity_date
                FROM user_progress
                WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn insert_progress(&self, record: &UserProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO user_progress (
                    user_id, current_week, current_day, streak, last_activity_date
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(record.user_id.as_str())
        .bind(i64::from(record.current_week))
        .bind(i64::from(record.current_day))
        .bind(i64::from(record.streak))
        .bind(record.last_activity_date)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn update_streak(
        &self,
        user_id: &UserId,
        expected: StreakStamp,
        next: StreakStamp,
    ) -> Result<(), StorageError> {
        // `IS` so a NULL last_activity_date compares equal to a NULL bind.
        let res = sqlx::query(
            r"
                UPDATE user_progress
                SET streak = ?2, last_activity_date = ?3
                WHERE user_id = ?1 AND streak = ?4 AND last_activity_date IS ?5
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(next.streak))
        .bind(next.last_activity_date)
        .bind(i64::from(expected.streak))
        .bind(expected.last_activity_date)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 1 {
            return Ok(());
        }

        match self.get_progress(user_id).await? {
            Some(_) => Err(StorageError::Conflict),
            None => Err(StorageError::NotFound),
        }
    }
}
