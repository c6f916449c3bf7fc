use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::QuizQuestion;
use crate::model::percentage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,
    #[error("all {total} questions have already been answered")]
    Finished { total: usize },
    #[error("quiz still has {remaining} unanswered questions")]
    Unfinished { remaining: usize },
}

/// Feedback band shown after a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// 70 % or better.
    Excellent,
    /// 50 % or better.
    Good,
    KeepPracticing,
}

impl Verdict {
    #[must_use]
    pub fn from_percentage(pct: u8) -> Self {
        match pct {
            70.. => Self::Excellent,
            50.. => Self::Good,
            _ => Self::KeepPracticing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion {
    pub question_id: String,
    pub given: String,
    pub correct: bool,
}

/// Feedback for a single answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub expected: String,
    pub explanation: String,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u8,
    pub verdict: Verdict,
}

/// Walks a lesson's questions in order and keeps the running score.
#[derive(Debug, Clone)]
pub struct QuizAttempt<'a> {
    questions: &'a [QuizQuestion],
    answers: Vec<AnsweredQuestion>,
}

impl<'a> QuizAttempt<'a> {
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if there is nothing to ask.
    pub fn new(questions: &'a [QuizQuestion]) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self {
            questions,
            answers: Vec::with_capacity(questions.len()),
        })
    }

    #[must_use]
    pub fn current(&self) -> Option<&'a QuizQuestion> {
        self.questions.get(self.answers.len())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.len() == self.questions.len()
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        let correct = self.answers.iter().filter(|a| a.correct).count();
        u32::try_from(correct).unwrap_or(u32::MAX)
    }

    /// Answer the current question and move on.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` once every question has an answer.
    pub fn answer(&mut self, given: impl Into<String>) -> Result<AnswerFeedback, QuizError> {
        let question = self.current().ok_or(QuizError::Finished {
            total: self.questions.len(),
        })?;
        let given = given.into();
        let correct = question.is_correct(&given);
        self.answers.push(AnsweredQuestion {
            question_id: question.id.clone(),
            given,
            correct,
        });
        Ok(AnswerFeedback {
            correct,
            expected: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
            is_last: self.is_complete(),
        })
    }

    /// # Errors
    ///
    /// Returns `QuizError::Unfinished` if questions remain.
    pub fn finish(&self) -> Result<QuizResult, QuizError> {
        if !self.is_complete() {
            return Err(QuizError::Unfinished {
                remaining: self.questions.len() - self.answers.len(),
            });
        }
        let score = self.score();
        let total_questions = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let pct = percentage(score, total_questions);
        Ok(QuizResult {
            score,
            total_questions,
            percentage: pct,
            verdict: Verdict::from_percentage(pct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::QuestionKind;

    fn question(id: &str, answer: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_owned(),
            kind: QuestionKind::Translation,
            question: format!("question {id}"),
            options: Vec::new(),
            correct_answer: answer.to_owned(),
            explanation: String::new(),
        }
    }

    #[test]
    fn scores_exact_matches_only() {
        let qs = vec![question("q1", "Good morning"), question("q2", "Mucho gusto"), question("q3", "am")];
        let mut attempt = QuizAttempt::new(&qs).unwrap();
        assert!(attempt.answer("Good morning").unwrap().correct);
        assert!(!attempt.answer("mucho gusto").unwrap().correct);
        let last = attempt.answer("am").unwrap();
        assert!(last.is_last);

        let result = attempt.finish().unwrap();
        assert_eq!(result.score, 2);
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.percentage, 67);
        assert_eq!(result.verdict, Verdict::Good);
    }

    fn graded(correct: usize, total: usize) -> QuizResult {
        let qs: Vec<QuizQuestion> = (0..total)
            .map(|i| question(&format!("q{i}"), "yes"))
            .collect();
        let mut attempt = QuizAttempt::new(&qs).unwrap();
        for i in 0..total {
            attempt.answer(if i < correct { "yes" } else { "no" }).unwrap();
        }
        attempt.finish().unwrap()
    }

    #[test]
    fn verdict_boundary_on_real_attempts() {
        // 9/13 rounds to 69
        let below = graded(9, 13);
        assert_eq!(below.percentage, 69);
        assert_eq!(below.verdict, Verdict::Good);

        let at = graded(7, 10);
        assert_eq!(at.percentage, 70);
        assert_eq!(at.verdict, Verdict::Excellent);

        let half = graded(1, 2);
        assert_eq!(half.verdict, Verdict::Good);
        let under_half = graded(6, 13);
        assert_eq!(under_half.percentage, 46);
        assert_eq!(under_half.verdict, Verdict::KeepPracticing);
    }

    #[test]
    fn answering_past_the_end_fails() {
        let qs = vec![question("q1", "I")];
        let mut attempt = QuizAttempt::new(&qs).unwrap();
        attempt.answer("He").unwrap();
        assert_eq!(
            attempt.answer("I").unwrap_err(),
            QuizError::Finished { total: 1 }
        );
        assert_eq!(attempt.finish().unwrap().verdict, Verdict::KeepPracticing);
    }

    #[test]
    fn finish_requires_all_answers() {
        let qs = vec![question("q1", "a"), question("q2", "b")];
        let mut attempt = QuizAttempt::new(&qs).unwrap();
        attempt.answer("a").unwrap();
        assert_eq!(
            attempt.finish().unwrap_err(),
            QuizError::Unfinished { remaining: 1 }
        );
    }

    #[test]
    fn empty_quiz_is_rejected() {
        assert_eq!(QuizAttempt::new(&[]).unwrap_err(), QuizError::Empty);
    }

    #[test]
    fn verdict_bands() {
        assert_eq!(Verdict::from_percentage(100), Verdict::Excellent);
        assert_eq!(Verdict::from_percentage(70), Verdict::Excellent);
        assert_eq!(Verdict::from_percentage(50), Verdict::Good);
        assert_eq!(Verdict::from_percentage(49), Verdict::KeepPracticing);
    }
}
