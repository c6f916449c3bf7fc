use serde::{Deserialize, Serialize};

use crate::model::LessonId;

/// A single day of the curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub title_es: String,
    pub description: String,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyItem>,
    pub grammar: GrammarPoint,
    #[serde(default)]
    pub phrases: Vec<Phrase>,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub english: String,
    pub spanish: String,
    pub pronunciation: String,
    pub example: String,
    pub example_es: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarPoint {
    pub title: String,
    pub title_es: String,
    pub explanation: String,
    #[serde(default)]
    pub examples: Vec<GrammarExample>,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarExample {
    pub english: String,
    pub spanish: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub english: String,
    pub spanish: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    Translation,
    FillBlank,
}

impl QuestionKind {
    /// Choice-style questions must carry the options to pick from.
    #[must_use]
    pub fn requires_options(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::FillBlank)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    /// Exact match against the expected answer.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

/// One step of the suggested daily study routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineStep {
    pub time: String,
    pub activity: String,
    pub activity_es: String,
    pub duration: String,
}

/// A Spanish sentence to translate into English, with the structure it drills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationItem {
    pub spanish: String,
    pub english: String,
    pub structure: String,
    #[serde(default)]
    pub tips: Vec<String>,
}
