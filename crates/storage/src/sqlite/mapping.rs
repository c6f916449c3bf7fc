use lingo_core::model::{LessonId, UserId};
use sqlx::Row;

use crate::repository::{QuizScoreRecord, StorageError, UserProgressRecord};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_str(raw: &str) -> Result<UserId, StorageError> {
    UserId::new(raw).map_err(ser)
}

pub(crate) fn lesson_id_from_str(raw: &str) -> Result<LessonId, StorageError> {
    LessonId::new(raw).map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<UserProgressRecord, StorageError> {
    Ok(UserProgressRecord {
        user_id: user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        current_week: u32_from_i64("current_week", row.try_get("current_week").map_err(ser)?)?,
        current_day: u32_from_i64("current_day", row.try_get("current_day").map_err(ser)?)?,
        streak: u32_from_i64("streak", row.try_get("streak").map_err(ser)?)?,
        last_activity_date: row.try_get("last_activity_date").map_err(ser)?,
    })
}

pub(crate) fn map_quiz_score_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuizScoreRecord, StorageError> {
    Ok(QuizScoreRecord {
        id: Some(row.try_get("id").map_err(ser)?),
        user_id: user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        lesson_id: lesson_id_from_str(&row.try_get::<String, _>("lesson_id").map_err(ser)?)?,
        score: u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

/// Maps driver errors, turning unique-key violations into `Conflict`.
pub(crate) fn write_error(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}
