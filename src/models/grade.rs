// src/models/grade.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::config::{DEFAULT_ASSIGNMENT_WEIGHT, DEFAULT_PARTICIPATION_WEIGHT, DEFAULT_QUIZ_WEIGHT};

/// Component weights. They are not required to sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GradeWeights {
    #[validate(range(min = 0, max = 1000))]
    pub quiz: i32,
    #[validate(range(min = 0, max = 1000))]
    pub assignment: i32,
    #[validate(range(min = 0, max = 1000))]
    pub participation: i32,
}

impl Default for GradeWeights {
    fn default() -> Self {
        Self {
            quiz: DEFAULT_QUIZ_WEIGHT,
            assignment: DEFAULT_ASSIGNMENT_WEIGHT,
            participation: DEFAULT_PARTICIPATION_WEIGHT,
        }
    }
}

/// Represents the 'grades' table in the database.
/// One row per (user_id, course_id), recomputed in place.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,

    pub quiz_average: Option<f64>,
    pub assignment_average: Option<f64>,
    pub participation_score: Option<f64>,
    pub final_grade: Option<f64>,

    pub quiz_weight: i32,
    pub assignment_weight: i32,
    pub participation_weight: i32,

    pub total_quizzes: i32,
    pub completed_quizzes: i32,
    pub total_assignments: i32,
    pub completed_assignments: i32,

    pub calculated_at: Option<DateTime<Utc>>,
}

impl Grade {
    pub fn weights(&self) -> GradeWeights {
        GradeWeights {
            quiz: self.quiz_weight,
            assignment: self.assignment_weight,
            participation: self.participation_weight,
        }
    }
}

/// The recomputed values written back onto a grade row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradeUpdate {
    pub quiz_average: Option<f64>,
    pub assignment_average: Option<f64>,
    pub participation_score: Option<f64>,
    pub final_grade: Option<f64>,
    pub total_quizzes: i32,
    pub completed_quizzes: i32,
    pub total_assignments: i32,
    pub completed_assignments: i32,
}
