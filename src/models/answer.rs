// src/models/answer.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'attempt_answers' table in the database.
/// Unique per (attempt_id, question_id); a second save overwrites the first.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,

    /// Selected option for MultipleChoice.
    pub option_id: Option<i64>,

    /// Serialized option id list for Checkbox, raw text for SingleAnswer.
    pub user_answer: Option<String>,

    /// `None` until the attempt is scored.
    pub correct: Option<bool>,
}

/// What the caller submits for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub option_id: Option<i64>,
    pub text: Option<String>,
}

impl AnswerInput {
    pub fn option(option_id: i64) -> Self {
        Self {
            option_id: Some(option_id),
            text: None,
        }
    }

    /// Serializes a Checkbox selection as a JSON array.
    pub fn selection(option_ids: &[i64]) -> Self {
        Self {
            option_id: None,
            text: serde_json::to_string(option_ids).ok(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            option_id: None,
            text: Some(text.into()),
        }
    }
}

/// The row the store upserts. `correct` is always reset to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerDraft {
    pub attempt_id: i64,
    pub question_id: i64,
    pub option_id: Option<i64>,
    pub user_answer: Option<String>,
}
