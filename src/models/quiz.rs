// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::question::Question;

/// Per-quiz attempt and timing policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct QuizSettings {
    /// `None` or `Some(0)` means unlimited attempts.
    #[validate(range(min = 0))]
    pub attempts_allowed: Option<i32>,

    #[validate(range(min = 1))]
    pub total_duration_minutes: Option<i32>,

    /// Mutually exclusive with `total_duration_minutes`.
    #[validate(range(min = 1))]
    pub per_question_duration_seconds: Option<i32>,

    #[serde(default)]
    pub shuffle_questions: bool,

    #[serde(default)]
    pub shuffle_options: bool,
}

impl QuizSettings {
    /// The attempt cap, if there is one.
    pub fn attempt_limit(&self) -> Option<i32> {
        self.attempts_allowed.filter(|n| *n > 0)
    }
}

/// A quiz hydrated with its ordered questions and their options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub is_published: bool,
    pub settings: QuizSettings,
    pub questions: Vec<Question>,
}

impl QuizDefinition {
    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Soft time limit in seconds.
    ///
    /// The total duration wins when set; otherwise the per-question allowance is
    /// multiplied by the number of questions.
    pub fn time_limit_seconds(&self) -> Option<i64> {
        match (
            self.settings.total_duration_minutes,
            self.settings.per_question_duration_seconds,
        ) {
            (Some(minutes), _) => Some(i64::from(minutes) * 60),
            (None, Some(seconds)) => Some(i64::from(seconds) * self.questions.len() as i64),
            (None, None) => None,
        }
    }
}

impl Validate for QuizDefinition {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.settings.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.settings.total_duration_minutes.is_some()
            && self.settings.per_question_duration_seconds.is_some()
        {
            let mut err = ValidationError::new("durations_mutually_exclusive");
            err.message = Some("set either a total or a per-question duration, not both".into());
            errors.add("settings", err);
        }

        for question in &self.questions {
            if question.quiz_id != self.id {
                let mut err = ValidationError::new("question_not_owned");
                err.message = Some(
                    format!("question {} belongs to quiz {}", question.id, question.quiz_id).into(),
                );
                errors.add("questions", err);
            }
            if let Err(question_errors) = question.validate() {
                for (_, field_errors) in question_errors.field_errors() {
                    for err in field_errors {
                        errors.add("questions", err.clone());
                    }
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
