mod ids;
mod quiz_score;
mod snapshot;

pub use ids::{LessonId, ParseIdError, UserId};
pub use quiz_score::QuizScore;
pub use snapshot::{FIRST_DAY, FIRST_WEEK, ProgressSnapshot};

pub(crate) use quiz_score::percentage;
