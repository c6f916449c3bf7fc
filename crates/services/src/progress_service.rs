use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use lingo_core::{
    model::{FIRST_DAY, FIRST_WEEK, LessonId, ProgressSnapshot, QuizScore, UserId},
    streak::{StreakRule, StreakUpdate},
    time::Clock,
};
use storage::repository::{
    CompletedLessonRepository, QuizScoreRecord, QuizScoreRepository, Storage, StorageError,
    UserProgressRecord, UserProgressRepository,
};

use crate::error::ProgressServiceError;

/// Upper bound on read-modify-write rounds when another writer keeps
/// changing the progress row.
pub const MAX_STREAK_ATTEMPTS: u32 = 3;

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Outcome of a persisted lesson completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonCompletion {
    /// `false` when the lesson was already in the completed set.
    pub newly_completed: bool,
    pub streak: StreakUpdate,
}

/// Outcome of a persisted quiz submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    pub id: i64,
    pub score: QuizScore,
    pub streak: StreakUpdate,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Reads and mutates per-user learning progress.
///
/// Every operation returns its storage result; deciding whether to surface or
/// swallow a failure is left to the caller (see `ProgressSession`). Guest
/// calls (`user == None`) never touch storage.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn UserProgressRepository>,
    completed_lessons: Arc<dyn CompletedLessonRepository>,
    quiz_scores: Arc<dyn QuizScoreRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn UserProgressRepository>,
        completed_lessons: Arc<dyn CompletedLessonRepository>,
        quiz_scores: Arc<dyn QuizScoreRepository>,
    ) -> Self {
        Self {
            clock,
            progress,
            completed_lessons,
            quiz_scores,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.completed_lessons),
            Arc::clone(&storage.quiz_scores),
        )
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Load the merged progress snapshot.
    ///
    /// Guests get [`ProgressSnapshot::guest`]. Missing rows count as their
    /// zero value, never as an error.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if any read fails.
    pub async fn load_progress(
        &self,
        user_id: Option<&UserId>,
    ) -> Result<ProgressSnapshot, ProgressServiceError> {
        let Some(user_id) = user_id else {
            return Ok(ProgressSnapshot::guest());
        };

        let record = self.progress.get_progress(user_id).await?;
        let completed = self.completed_lessons.completed_lessons(user_id).await?;
        let scores = self
            .quiz_scores
            .scores_for_user(user_id)
            .await?
            .into_iter()
            .map(QuizScoreRecord::into_score)
            .collect();

        let (week, day, streak, last) = record.map_or((FIRST_WEEK, FIRST_DAY, 0, None), |r| {
            (r.current_week, r.current_day, r.streak, r.last_activity_date)
        });
        Ok(ProgressSnapshot::from_parts(
            week, day, streak, last, completed, scores,
        ))
    }

    /// Mark a lesson as completed and count today towards the streak.
    ///
    /// Completing an already-completed lesson leaves the set alone but still
    /// runs the streak update. Returns `Ok(None)` for guests.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if either write fails.
    pub async fn complete_lesson(
        &self,
        user_id: Option<&UserId>,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonCompletion>, ProgressServiceError> {
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let now = self.clock.now();
        let newly_completed = self
            .completed_lessons
            .mark_completed(user_id, lesson_id, now)
            .await?;
        let streak = self.update_streak_on(user_id, now.date_naive()).await?;

        Ok(Some(LessonCompletion {
            newly_completed,
            streak,
        }))
    }

    /// Append a quiz score stamped with the current time.
    ///
    /// Scores are taken as given; `total_questions == 0` is left for the
    /// store to reject. Returns `Ok(None)` for guests.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if either write fails.
    pub async fn record_quiz_score(
        &self,
        user_id: Option<&UserId>,
        lesson_id: &LessonId,
        score: u32,
        total_questions: u32,
    ) -> Result<Option<QuizSubmission>, ProgressServiceError> {
        let entry = QuizScore::new(lesson_id.clone(), score, total_questions, self.clock.now());
        self.submit_quiz_score(user_id, entry).await
    }

    /// Append an already stamped quiz score.
    ///
    /// The streak counts the clock's current day, whatever `completed_at` says.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if either write fails.
    pub async fn submit_quiz_score(
        &self,
        user_id: Option<&UserId>,
        entry: QuizScore,
    ) -> Result<Option<QuizSubmission>, ProgressServiceError> {
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let id = self
            .quiz_scores
            .append_score(QuizScoreRecord::from_score(user_id.clone(), &entry))
            .await?;
        let streak = self.update_streak_on(user_id, self.clock.today()).await?;

        Ok(Some(QuizSubmission {
            id,
            score: entry,
            streak,
        }))
    }

    /// Count today as an active day for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on storage failures and
    /// `ProgressServiceError::StreakContention` if the row kept changing.
    pub async fn update_streak(
        &self,
        user_id: &UserId,
    ) -> Result<StreakUpdate, ProgressServiceError> {
        self.update_streak_on(user_id, self.clock.today()).await
    }

    async fn update_streak_on(
        &self,
        user_id: &UserId,
        today: NaiveDate,
    ) -> Result<StreakUpdate, ProgressServiceError> {
        for attempt in 1..=MAX_STREAK_ATTEMPTS {
            let existing = self.progress.get_progress(user_id).await?;
            let update = StreakRule::apply(today, existing.as_ref().map(UserProgressRecord::stamp));

            // Same-day activity still writes the unchanged values.
            let written = match existing {
                None => {
                    let record = UserProgressRecord::first_activity(user_id.clone(), &update);
                    self.progress.insert_progress(&record).await
                }
                Some(record) => {
                    self.progress
                        .update_streak(user_id, record.stamp(), update.stamp())
                        .await
                }
            };

            match written {
                Ok(()) => {
                    debug!(
                        user = %user_id,
                        from = update.previous_state().as_str(),
                        streak = update.streak(),
                        "streak updated"
                    );
                    return Ok(update);
                }
                Err(StorageError::Conflict | StorageError::NotFound) => {
                    debug!(user = %user_id, attempt, "progress row changed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ProgressServiceError::StreakContention {
            attempts: MAX_STREAK_ATTEMPTS,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Duration;
    use lingo_core::streak::{StreakStamp, StreakState};
    use lingo_core::time::{fixed_clock, fixed_now};
    use std::sync::atomic::{AtomicU32, Ordering};
    use storage::repository::InMemoryRepository;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn lesson(id: &str) -> LessonId {
        LessonId::new(id).unwrap()
    }

    fn service(repo: &InMemoryRepository, clock: Clock) -> ProgressService {
        ProgressService::from_storage(clock, &Storage::from_repository(repo.clone()))
    }

    #[tokio::test]
    async fn first_completion_starts_streak_at_one() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo, fixed_clock());

        let done = svc
            .complete_lesson(Some(&user("u1")), &lesson("w1-d1"))
            .await
            .unwrap()
            .unwrap();
        assert!(done.newly_completed);
        assert_eq!(done.streak.streak(), 1);
        assert_eq!(done.streak.previous_state(), StreakState::NoRecord);

        let row = repo.get_progress(&user("u1")).await.unwrap().unwrap();
        assert_eq!(row.streak, 1);
        assert_eq!(row.last_activity_date, Some(fixed_now().date_naive()));
    }

    #[tokio::test]
    async fn repeating_a_completion_same_day_is_idempotent() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo, fixed_clock());
        let u = user("u1");

        svc.complete_lesson(Some(&u), &lesson("w1-d1")).await.unwrap();
        let again = svc
            .complete_lesson(Some(&u), &lesson("w1-d1"))
            .await
            .unwrap()
            .unwrap();
        assert!(!again.newly_completed);
        assert_eq!(again.streak.streak(), 1);

        let snap = svc.load_progress(Some(&u)).await.unwrap();
        assert_eq!(snap.completed_lessons().len(), 1);
        assert_eq!(snap.streak(), 1);
    }

    #[tokio::test]
    async fn next_day_continues_and_gap_resets() {
        let repo = InMemoryRepository::new();
        let u = user("u1");
        let day0 = fixed_clock();

        service(&repo, day0)
            .complete_lesson(Some(&u), &lesson("w1-d1"))
            .await
            .unwrap();
        let day1 = service(&repo, day0.plus_days(1))
            .update_streak(&u)
            .await
            .unwrap();
        assert_eq!(day1.streak(), 2);
        assert!(day1.is_continuation());

        let day3 = service(&repo, day0.plus_days(3))
            .update_streak(&u)
            .await
            .unwrap();
        assert_eq!(day3.streak(), 1);
        assert_eq!(day3.previous_state(), StreakState::Stale);
    }

    #[tokio::test]
    async fn quiz_scores_load_newest_first() {
        let repo = InMemoryRepository::new();
        let u = user("u1");
        let mut clock = fixed_clock();

        for score in 1..=3 {
            service(&repo, clock)
                .record_quiz_score(Some(&u), &lesson("w1-d1"), score, 3)
                .await
                .unwrap();
            clock.advance(Duration::minutes(10));
        }

        let snap = service(&repo, clock).load_progress(Some(&u)).await.unwrap();
        let order: Vec<u32> = snap.quiz_scores().iter().map(|s| s.score).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(snap.streak(), 1);
    }

    #[tokio::test]
    async fn back_dated_score_counts_for_the_clock_day() {
        let repo = InMemoryRepository::new();
        let u = user("u1");
        let day0 = fixed_clock();
        let day1 = day0.plus_days(1);

        service(&repo, day0).update_streak(&u).await.unwrap();
        service(&repo, day1).update_streak(&u).await.unwrap();

        let stamped_day0 = QuizScore::new(lesson("w1-d1"), 2, 3, day0.now());
        let submitted = service(&repo, day1)
            .submit_quiz_score(Some(&u), stamped_day0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(submitted.streak.previous_state(), StreakState::ActiveToday);
        assert_eq!(submitted.streak.streak(), 2);

        let row = repo.get_progress(&u).await.unwrap().unwrap();
        assert_eq!(row.streak, 2);
        assert_eq!(row.last_activity_date, Some(day1.today()));
    }

    #[tokio::test]
    async fn missing_rows_load_as_zero_values() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo, fixed_clock());
        let snap = svc.load_progress(Some(&user("new"))).await.unwrap();
        assert_eq!(snap, ProgressSnapshot::guest());
    }

    /// Counts every call and fails all of them, to prove guests never reach storage.
    #[derive(Default)]
    struct Tripwire {
        calls: AtomicU32,
    }

    impl Tripwire {
        fn hit(&self) -> StorageError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StorageError::Connection("tripwire".into())
        }
    }

    #[async_trait]
    impl UserProgressRepository for Tripwire {
        async fn get_progress(
            &self,
            _: &UserId,
        ) -> Result<Option<UserProgressRecord>, StorageError> {
            Err(self.hit())
        }
        async fn insert_progress(&self, _: &UserProgressRecord) -> Result<(), StorageError> {
            Err(self.hit())
        }
        async fn update_streak(
            &self,
            _: &UserId,
            _: StreakStamp,
            _: StreakStamp,
        ) -> Result<(), StorageError> {
            Err(self.hit())
        }
    }

    #[async_trait]
    impl CompletedLessonRepository for Tripwire {
        async fn mark_completed(
            &self,
            _: &UserId,
            _: &LessonId,
            _: DateTime<Utc>,
        ) -> Result<bool, StorageError> {
            Err(self.hit())
        }
        async fn completed_lessons(&self, _: &UserId) -> Result<Vec<LessonId>, StorageError> {
            Err(self.hit())
        }
    }

    #[async_trait]
    impl QuizScoreRepository for Tripwire {
        async fn append_score(&self, _: QuizScoreRecord) -> Result<i64, StorageError> {
            Err(self.hit())
        }
        async fn scores_for_user(&self, _: &UserId) -> Result<Vec<QuizScoreRecord>, StorageError> {
            Err(self.hit())
        }
    }

    #[tokio::test]
    async fn guests_never_touch_storage() {
        let wire = Arc::new(Tripwire::default());
        let svc = ProgressService::new(
            fixed_clock(),
            wire.clone(),
            wire.clone(),
            wire.clone(),
        );

        assert_eq!(svc.load_progress(None).await.unwrap(), ProgressSnapshot::guest());
        assert!(svc.complete_lesson(None, &lesson("w1-d1")).await.unwrap().is_none());
        assert!(
            svc.record_quiz_score(None, &lesson("w1-d1"), 2, 3)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(wire.calls.load(Ordering::SeqCst), 0);

        let err = svc.load_progress(Some(&user("u1"))).await.unwrap_err();
        assert!(matches!(err, ProgressServiceError::Storage(_)));
        assert_eq!(wire.calls.load(Ordering::SeqCst), 1);
    }

    /// Wraps the in-memory repo and bumps the row behind the service's back
    /// on the first `n` compare-and-set attempts.
    struct Interloper {
        inner: InMemoryRepository,
        remaining: AtomicU32,
    }

    #[async_trait]
    impl UserProgressRepository for Interloper {
        async fn get_progress(
            &self,
            user_id: &UserId,
        ) -> Result<Option<UserProgressRecord>, StorageError> {
            self.inner.get_progress(user_id).await
        }
        async fn insert_progress(&self, record: &UserProgressRecord) -> Result<(), StorageError> {
            self.inner.insert_progress(record).await
        }
        async fn update_streak(
            &self,
            user_id: &UserId,
            expected: StreakStamp,
            next: StreakStamp,
        ) -> Result<(), StorageError> {
            if self.remaining.load(Ordering::SeqCst) > 0 {
                self.remaining.fetch_sub(1, Ordering::SeqCst);
                let other = StreakStamp::new(expected.streak + 1, next.last_activity_date);
                self.inner.update_streak(user_id, expected, other).await?;
            }
            self.inner.update_streak(user_id, expected, next).await
        }
    }

    async fn seeded_interloper(conflicts: u32) -> (Arc<Interloper>, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let yesterday = fixed_now().date_naive() - Duration::days(1);
        repo.insert_progress(&UserProgressRecord {
            user_id: user("u1"),
            current_week: 1,
            current_day: 1,
            streak: 4,
            last_activity_date: Some(yesterday),
        })
        .await
        .unwrap();
        let wrapped = Arc::new(Interloper {
            inner: repo.clone(),
            remaining: AtomicU32::new(conflicts),
        });
        (wrapped, repo)
    }

    #[tokio::test]
    async fn concurrent_writer_does_not_double_count() {
        let (wrapped, repo) = seeded_interloper(1).await;
        let svc = ProgressService::new(
            fixed_clock(),
            wrapped,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );

        // the other writer already moved the streak 4 -> 5 for today
        let update = svc.update_streak(&user("u1")).await.unwrap();
        assert_eq!(update.previous_state(), StreakState::ActiveToday);
        assert_eq!(update.streak(), 5);
        assert_eq!(repo.get_progress(&user("u1")).await.unwrap().unwrap().streak, 5);
    }

    #[tokio::test]
    async fn persistent_contention_gives_up() {
        let (wrapped, repo) = seeded_interloper(MAX_STREAK_ATTEMPTS).await;
        let svc = ProgressService::new(
            fixed_clock(),
            wrapped,
            Arc::new(repo.clone()),
            Arc::new(repo),
        );

        let err = svc.update_streak(&user("u1")).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressServiceError::StreakContention { attempts: MAX_STREAK_ATTEMPTS }
        ));
    }
}
