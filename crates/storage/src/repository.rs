use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lingo_core::model::{FIRST_DAY, FIRST_WEEK, LessonId, QuizScore, UserId};
use lingo_core::streak::{StreakStamp, StreakUpdate};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of the `user_progress` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgressRecord {
    pub user_id: UserId,
    pub current_week: u32,
    pub current_day: u32,
    pub streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}

impl UserProgressRecord {
    /// Row created on a learner's first qualifying activity.
    #[must_use]
    pub fn first_activity(user_id: UserId, update: &StreakUpdate) -> Self {
        Self {
            user_id,
            current_week: FIRST_WEEK,
            current_day: FIRST_DAY,
            streak: update.streak(),
            last_activity_date: Some(update.last_activity_date()),
        }
    }

    #[must_use]
    pub fn stamp(&self) -> StreakStamp {
        StreakStamp::new(self.streak, self.last_activity_date)
    }
}

/// Persisted shape of a `quiz_scores` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizScoreRecord {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

impl QuizScoreRecord {
    #[must_use]
    pub fn from_score(user_id: UserId, score: &QuizScore) -> Self {
        Self {
            id: None,
            user_id,
            lesson_id: score.lesson_id.clone(),
            score: score.score,
            total_questions: score.total_questions,
            completed_at: score.completed_at,
        }
    }

    #[must_use]
    pub fn into_score(self) -> QuizScore {
        QuizScore::new(
            self.lesson_id,
            self.score,
            self.total_questions,
            self.completed_at,
        )
    }
}

/// Repository contract for the one-row-per-user progress record.
#[async_trait]
pub trait UserProgressRepository: Send + Sync {
    /// Fetch the learner's progress row.
    ///
    /// Returns `Ok(None)` when the learner has no row yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_progress(&self, user_id: &UserId)
    -> Result<Option<UserProgressRecord>, StorageError>;

    /// Create the learner's progress row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a row already exists.
    async fn insert_progress(&self, record: &UserProgressRecord) -> Result<(), StorageError>;

    /// Overwrite streak and last activity date, provided they still hold `expected`.
    ///
    /// The write happens even when `next == expected`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing and
    /// `StorageError::Conflict` if it changed since `expected` was read.
    async fn update_streak(
        &self,
        user_id: &UserId,
        expected: StreakStamp,
        next: StreakStamp,
    ) -> Result<(), StorageError>;
}

/// Repository contract for the completed-lesson set.
#[async_trait]
pub trait CompletedLessonRepository: Send + Sync {
    /// Add a lesson to the learner's completed set.
    ///
    /// Returns `true` when the pair was not present before.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pair cannot be stored.
    async fn mark_completed(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn completed_lessons(&self, user_id: &UserId) -> Result<Vec<LessonId>, StorageError>;
}

/// Repository contract for the append-only quiz score log.
#[async_trait]
pub trait QuizScoreRepository: Send + Sync {
    /// Append a score and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the score cannot be stored.
    async fn append_score(&self, record: QuizScoreRecord) -> Result<i64, StorageError>;

    /// All scores for a learner, newest first (ties: latest id first).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn scores_for_user(&self, user_id: &UserId)
    -> Result<Vec<QuizScoreRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<UserId, UserProgressRecord>>>,
    completed: Arc<Mutex<HashMap<UserId, BTreeSet<LessonId>>>>,
    scores: Arc<Mutex<Vec<QuizScoreRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl UserProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(user_id).cloned())
    }

    async fn insert_progress(&self, record: &UserProgressRecord) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        if guard.contains_key(&record.user_id) {
            return Err(StorageError::Conflict);
        }
        guard.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn update_streak(
        &self,
        user_id: &UserId,
        expected: StreakStamp,
        next: StreakStamp,
    ) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let row = guard.get_mut(user_id).ok_or(StorageError::NotFound)?;
        if row.stamp() != expected {
            return Err(StorageError::Conflict);
        }
        row.streak = next.streak;
        row.last_activity_date = next.last_activity_date;
        Ok(())
    }
}

#[async_trait]
impl CompletedLessonRepository for InMemoryRepository {
    async fn mark_completed(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
        _completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut guard = self.completed.lock().map_err(poisoned)?;
        Ok(guard
            .entry(user_id.clone())
            .or_default()
            .insert(lesson_id.clone()))
    }

    async fn completed_lessons(&self, user_id: &UserId) -> Result<Vec<LessonId>, StorageError> {
        let guard = self.completed.lock().map_err(poisoned)?;
        Ok(guard
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuizScoreRepository for InMemoryRepository {
    async fn append_score(&self, mut record: QuizScoreRecord) -> Result<i64, StorageError> {
        let mut guard = self.scores.lock().map_err(poisoned)?;
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("quiz score id overflow".into()))?;
        record.id = Some(id);
        guard.push(record);
        Ok(id)
    }

    async fn scores_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<QuizScoreRecord>, StorageError> {
        let guard = self.scores.lock().map_err(poisoned)?;
        let mut out: Vec<QuizScoreRecord> = guard
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(out)
    }
}

/// Aggregates the progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn UserProgressRepository>,
    pub completed_lessons: Arc<dyn CompletedLessonRepository>,
    pub quiz_scores: Arc<dyn QuizScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one repository value for all three concerns.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: UserProgressRepository
            + CompletedLessonRepository
            + QuizScoreRepository
            + Clone
            + 'static,
    {
        let progress: Arc<dyn UserProgressRepository> = Arc::new(repo.clone());
        let completed_lessons: Arc<dyn CompletedLessonRepository> = Arc::new(repo.clone());
        let quiz_scores: Arc<dyn QuizScoreRepository> = Arc::new(repo);
        Self {
            progress,
            completed_lessons,
            quiz_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lingo_core::streak::StreakRule;
    use lingo_core::time::fixed_now;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn lesson(id: &str) -> LessonId {
        LessonId::new(id).unwrap()
    }

    #[tokio::test]
    async fn progress_row_is_unique_per_user() {
        let repo = InMemoryRepository::new();
        let update = StreakRule::apply(fixed_now().date_naive(), None);
        let record = UserProgressRecord::first_activity(user("u1"), &update);

        repo.insert_progress(&record).await.unwrap();
        let err = repo.insert_progress(&record).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let fetched = repo.get_progress(&user("u1")).await.unwrap().unwrap();
        assert_eq!(fetched.streak, 1);
        assert_eq!(fetched.current_week, 1);
        assert!(repo.get_progress(&user("u2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_streak_compares_before_setting() {
        let repo = InMemoryRepository::new();
        let today = fixed_now().date_naive();
        let record = UserProgressRecord::first_activity(user("u1"), &StreakRule::apply(today, None));
        repo.insert_progress(&record).await.unwrap();

        let stale = StreakStamp::new(9, Some(today));
        let next = StreakStamp::new(2, Some(today));
        let err = repo.update_streak(&user("u1"), stale, next).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        repo.update_streak(&user("u1"), record.stamp(), next)
            .await
            .unwrap();
        assert_eq!(repo.get_progress(&user("u1")).await.unwrap().unwrap().streak, 2);

        let err = repo
            .update_streak(&user("nobody"), next, next)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn completed_lessons_behave_as_a_set() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        assert!(repo.mark_completed(&user("u1"), &lesson("w1-d1"), now).await.unwrap());
        assert!(!repo.mark_completed(&user("u1"), &lesson("w1-d1"), now).await.unwrap());
        assert!(repo.mark_completed(&user("u1"), &lesson("w1-d2"), now).await.unwrap());

        let done = repo.completed_lessons(&user("u1")).await.unwrap();
        assert_eq!(done, vec![lesson("w1-d1"), lesson("w1-d2")]);
        assert!(repo.completed_lessons(&user("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scores_come_back_newest_first() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        for (i, offset) in [0_i64, 2, 1].into_iter().enumerate() {
            let score = QuizScore::new(
                lesson("w1-d1"),
                u32::try_from(i).unwrap(),
                3,
                now + Duration::minutes(offset),
            );
            repo.append_score(QuizScoreRecord::from_score(user("u1"), &score))
                .await
                .unwrap();
        }
        let other = QuizScore::new(lesson("w1-d1"), 3, 3, now);
        repo.append_score(QuizScoreRecord::from_score(user("u2"), &other))
            .await
            .unwrap();

        let scores = repo.scores_for_user(&user("u1")).await.unwrap();
        let order: Vec<u32> = scores.iter().map(|r| r.score).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
