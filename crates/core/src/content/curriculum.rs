use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Lesson, RoutineStep, TranslationItem};
use crate::model::{LessonId, percentage};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CurriculumError {
    #[error("curriculum is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("week numbers must run 1..=n in order, found {found} at position {position}")]
    WeekOrder { position: usize, found: u32 },

    #[error("lesson id {0} appears more than once")]
    DuplicateLesson(LessonId),

    #[error("question {question} in lesson {lesson} has no options")]
    MissingOptions { lesson: LessonId, question: String },

    #[error("question {question} in lesson {lesson} does not list its answer among the options")]
    AnswerNotInOptions { lesson: LessonId, question: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub week_number: u32,
    pub title: String,
    pub title_es: String,
    pub theme: String,
    pub theme_es: String,
    #[serde(default)]
    pub icon: String,
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub conversation_topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCurriculum {
    weeks: Vec<Week>,
    #[serde(default)]
    daily_routine: Vec<RoutineStep>,
    #[serde(default)]
    translations: Vec<TranslationItem>,
}

/// Read-only course catalogue.
///
/// Lessons are looked up by id; the index is built once at load time.
#[derive(Debug, Clone)]
pub struct Curriculum {
    weeks: Vec<Week>,
    daily_routine: Vec<RoutineStep>,
    translations: Vec<TranslationItem>,
    // lesson id -> (week index, lesson index)
    index: HashMap<LessonId, (usize, usize)>,
}

impl Curriculum {
    /// Build and validate a curriculum.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError` if weeks are out of order, a lesson id repeats,
    /// or a choice question is malformed.
    pub fn new(weeks: Vec<Week>, daily_routine: Vec<RoutineStep>) -> Result<Self, CurriculumError> {
        let mut index = HashMap::new();
        for (w, week) in weeks.iter().enumerate() {
            let expected = u32::try_from(w + 1).unwrap_or(u32::MAX);
            if week.week_number != expected {
                return Err(CurriculumError::WeekOrder {
                    position: w,
                    found: week.week_number,
                });
            }
            for (l, lesson) in week.lessons.iter().enumerate() {
                validate_quiz(lesson)?;
                if index.insert(lesson.id.clone(), (w, l)).is_some() {
                    return Err(CurriculumError::DuplicateLesson(lesson.id.clone()));
                }
            }
        }

        Ok(Self {
            weeks,
            daily_routine,
            translations: Vec::new(),
            index,
        })
    }

    /// Parse a curriculum from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError::Parse` for malformed JSON and the validation
    /// errors of [`Curriculum::new`].
    pub fn from_json_str(json: &str) -> Result<Self, CurriculumError> {
        let raw: RawCurriculum = serde_json::from_str(json)?;
        Ok(Self::new(raw.weeks, raw.daily_routine)?.with_translations(raw.translations))
    }

    /// Attach the sentence-translation drill.
    #[must_use]
    pub fn with_translations(mut self, translations: Vec<TranslationItem>) -> Self {
        self.translations = translations;
        self
    }

    #[must_use]
    pub fn weeks(&self) -> &[Week] {
        &self.weeks
    }

    #[must_use]
    pub fn week(&self, week_number: u32) -> Option<&Week> {
        let idx = usize::try_from(week_number).ok()?.checked_sub(1)?;
        self.weeks.get(idx)
    }

    #[must_use]
    pub fn daily_routine(&self) -> &[RoutineStep] {
        &self.daily_routine
    }

    #[must_use]
    pub fn translations(&self) -> &[TranslationItem] {
        &self.translations
    }

    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        let (w, l) = *self.index.get(id)?;
        self.weeks.get(w)?.lessons.get(l)
    }

    #[must_use]
    pub fn week_of(&self, id: &LessonId) -> Option<&Week> {
        let (w, _) = *self.index.get(id)?;
        self.weeks.get(w)
    }

    #[must_use]
    pub fn contains(&self, id: &LessonId) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.index.len()
    }

    /// Percentage of a week's lessons found in `completed`. Unknown weeks and
    /// weeks without lessons report 0.
    #[must_use]
    pub fn week_progress(&self, week_number: u32, completed: &HashSet<LessonId>) -> u8 {
        let Some(week) = self.week(week_number) else {
            return 0;
        };
        let done = week
            .lessons
            .iter()
            .filter(|l| completed.contains(&l.id))
            .count();
        ratio(done, week.lessons.len())
    }

    /// Percentage of all lessons found in `completed`. Ids that are not part of
    /// this curriculum are ignored.
    #[must_use]
    pub fn overall_progress(&self, completed: &HashSet<LessonId>) -> u8 {
        let done = completed.iter().filter(|id| self.contains(id)).count();
        ratio(done, self.lesson_count())
    }
}

fn ratio(done: usize, total: usize) -> u8 {
    let done = u32::try_from(done).unwrap_or(u32::MAX);
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    percentage(done, total)
}

fn validate_quiz(lesson: &Lesson) -> Result<(), CurriculumError> {
    for q in &lesson.quiz {
        if !q.kind.requires_options() {
            continue;
        }
        if q.options.is_empty() {
            return Err(CurriculumError::MissingOptions {
                lesson: lesson.id.clone(),
                question: q.id.clone(),
            });
        }
        if !q.options.iter().any(|o| o == &q.correct_answer) {
            return Err(CurriculumError::AnswerNotInOptions {
                lesson: lesson.id.clone(),
                question: q.id.clone(),
            });
        }
    }
    Ok(())
}
