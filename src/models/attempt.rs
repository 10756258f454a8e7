// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::answer::Answer;

/// Where an attempt is in its lifecycle. `NotStarted` has no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    InProgress,
    Submitted,
}

/// Represents the 'quiz_attempts' table in the database.
/// One user's single run through a quiz.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,

    /// 1-based, increasing per (user, quiz).
    pub attempt_number: i32,

    pub started_at: DateTime<Utc>,

    /// `None` while the attempt is in progress.
    pub submitted_at: Option<DateTime<Utc>>,

    pub correct_count: Option<i32>,
    pub wrong_count: Option<i32>,
    /// Questions the attempt was scored against. Later quiz edits do not touch it.
    pub total_questions: Option<i32>,
    pub time_spent_seconds: Option<i32>,
}

impl Attempt {
    pub fn state(&self) -> AttemptState {
        if self.submitted_at.is_some() {
            AttemptState::Submitted
        } else {
            AttemptState::InProgress
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.state() == AttemptState::Submitted
    }
}

/// An attempt together with the answers saved so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptWithAnswers {
    pub attempt: Attempt,
    pub answers: Vec<Answer>,
}
