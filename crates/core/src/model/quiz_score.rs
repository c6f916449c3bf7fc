use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::LessonId;

/// One submitted quiz result. Entries are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub lesson_id: LessonId,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

impl QuizScore {
    #[must_use]
    pub fn new(
        lesson_id: LessonId,
        score: u32,
        total_questions: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            lesson_id,
            score,
            total_questions,
            completed_at,
        }
    }

    /// Rounded percentage of correct answers. A zero total yields 0.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        percentage(self.score, self.total_questions)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn percentage(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (f64::from(part) / f64::from(whole) * 100.0).round();
    // clamp: callers may hand in score > total
    pct.min(100.0) as u8
}
