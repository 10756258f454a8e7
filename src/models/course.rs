// src/models/course.rs

use serde::{Deserialize, Serialize};

/// One submitted attempt, measured against the questions it was scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptScore {
    pub correct_count: i32,
    pub total_questions: i32,
}

/// A published quiz and the user's submitted results on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizActivity {
    pub quiz_id: i64,
    /// Questions in the quiz as it is now.
    pub question_count: i64,
    pub submitted_scores: Vec<AttemptScore>,
}

/// Lifecycle of an assignment submission as reported by the submission subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    Graded,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Graded => "graded",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(SubmissionStatus::Draft),
            "submitted" => Some(SubmissionStatus::Submitted),
            "graded" => Some(SubmissionStatus::Graded),
            _ => None,
        }
    }
}

/// One assignment submission's scores. Produced externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionScore {
    pub status: SubmissionStatus,
    /// Human-approved score.
    pub final_score: Option<f64>,
    /// Score from the AI grader.
    pub ai_score: Option<f64>,
}

impl SubmissionScore {
    /// The approved score, falling back to the AI score.
    pub fn effective_score(&self) -> Option<f64> {
        self.final_score.or(self.ai_score)
    }
}

/// A published assignment and the user's submissions on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentActivity {
    pub assignment_id: i64,
    pub max_points: f64,
    pub submissions: Vec<SubmissionScore>,
}

/// Everything the aggregator needs for one (user, course), fetched in one go.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CourseActivity {
    pub quizzes: Vec<QuizActivity>,
    pub assignments: Vec<AssignmentActivity>,
    pub published_lessons: i64,
    pub completed_lessons: i64,
}
