// src/error.rs

use thiserror::Error;
use validator::ValidationErrors;

/// Engine-wide error enum.
///
/// Everything except `Storage` is a domain rejection that callers surface
/// to the user as-is and must not retry.
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("attempt limit of {allowed} reached for quiz {quiz_id}")]
    AttemptLimitExceeded { quiz_id: i64, allowed: i32 },

    #[error("attempt {attempt_id} is still in progress for quiz {quiz_id}")]
    AttemptInProgress { attempt_id: i64, quiz_id: i64 },

    #[error("attempt {0} has already been submitted")]
    AlreadySubmitted(i64),

    #[error("question {question_id} is not part of quiz {quiz_id}")]
    QuestionNotInQuiz { question_id: i64, quiz_id: i64 },

    #[error("option {option_id} does not belong to question {question_id}")]
    OptionNotInQuestion { option_id: i64, question_id: i64 },

    #[error("invalid answer format: {0}")]
    InvalidAnswerFormat(String),

    #[error("quiz {0} not found")]
    QuizNotFound(i64),

    #[error("attempt {0} not found")]
    AttemptNotFound(i64),

    #[error("invalid definition: {0}")]
    InvalidDefinition(#[from] ValidationErrors),

    /// Infrastructure failure. The transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AssessmentError {
    /// Returns `true` for user-visible rejections, `false` for infrastructure failures.
    pub fn is_domain(&self) -> bool {
        !matches!(self, AssessmentError::Storage(_))
    }
}

pub type AssessmentResult<T> = Result<T, AssessmentError>;
