use std::collections::HashSet;

use chrono::NaiveDate;

use crate::model::{LessonId, QuizScore};
use crate::streak::{StreakStamp, StreakUpdate};

pub const FIRST_WEEK: u32 = 1;
pub const FIRST_DAY: u32 = 1;

/// Merged, in-memory view of a learner's progress.
///
/// Quiz scores are kept newest first by `completed_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    current_week: u32,
    current_day: u32,
    streak: u32,
    last_activity_date: Option<NaiveDate>,
    completed_lessons: HashSet<LessonId>,
    quiz_scores: Vec<QuizScore>,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self::guest()
    }
}

impl ProgressSnapshot {
    /// The fixed zero state used for guests and for users without any rows.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            current_week: FIRST_WEEK,
            current_day: FIRST_DAY,
            streak: 0,
            last_activity_date: None,
            completed_lessons: HashSet::new(),
            quiz_scores: Vec::new(),
        }
    }

    /// Rebuild a snapshot from persisted parts.
    ///
    /// Scores are re-sorted so the newest-first order holds regardless of
    /// how the store returned them.
    #[must_use]
    pub fn from_parts(
        current_week: u32,
        current_day: u32,
        streak: u32,
        last_activity_date: Option<NaiveDate>,
        completed_lessons: impl IntoIterator<Item = LessonId>,
        quiz_scores: Vec<QuizScore>,
    ) -> Self {
        let mut quiz_scores = quiz_scores;
        quiz_scores.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Self {
            current_week: current_week.max(FIRST_WEEK),
            current_day: current_day.max(FIRST_DAY),
            streak,
            last_activity_date,
            completed_lessons: completed_lessons.into_iter().collect(),
            quiz_scores,
        }
    }

    #[must_use]
    pub fn current_week(&self) -> u32 {
        self.current_week
    }

    #[must_use]
    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn last_activity_date(&self) -> Option<NaiveDate> {
        self.last_activity_date
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &HashSet<LessonId> {
        &self.completed_lessons
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &[QuizScore] {
        &self.quiz_scores
    }

    /// Most recent score for a lesson, if any quiz was submitted for it.
    #[must_use]
    pub fn latest_score_for(&self, lesson_id: &LessonId) -> Option<&QuizScore> {
        self.quiz_scores.iter().find(|s| &s.lesson_id == lesson_id)
    }

    /// Adds a lesson to the completed set. Returns `false` if it was already there.
    pub fn mark_completed(&mut self, lesson_id: LessonId) -> bool {
        self.completed_lessons.insert(lesson_id)
    }

    /// Inserts a quiz score while keeping the newest-first order.
    ///
    /// A score stamped with the latest time lands at the front; entries with
    /// equal timestamps keep the new one first.
    pub fn push_quiz_score(&mut self, score: QuizScore) {
        let at = self
            .quiz_scores
            .iter()
            .position(|existing| existing.completed_at <= score.completed_at)
            .unwrap_or(self.quiz_scores.len());
        self.quiz_scores.insert(at, score);
    }

    #[must_use]
    pub fn streak_stamp(&self) -> StreakStamp {
        StreakStamp::new(self.streak, self.last_activity_date)
    }

    /// Applies the outcome of a streak update.
    pub fn apply_streak(&mut self, update: &StreakUpdate) {
        self.streak = update.streak();
        self.last_activity_date = Some(update.last_activity_date());
    }
}
