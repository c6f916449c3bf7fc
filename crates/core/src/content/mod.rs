//! Course content: weeks, lessons and their quizzes.

mod curriculum;
mod lesson;

pub use curriculum::{Curriculum, CurriculumError, Week};
pub use lesson::{
    GrammarExample, GrammarPoint, Lesson, Phrase, QuestionKind, QuizQuestion, RoutineStep,
    TranslationItem, VocabularyItem,
};
