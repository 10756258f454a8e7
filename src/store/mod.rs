// src/store/mod.rs

// Persistence seams for the engine.
// Each mutating method is atomic on its own: one transaction (Postgres) or one
// critical section (memory). Aggregates come back fully hydrated.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AssessmentResult,
    models::{
        answer::{Answer, AnswerDraft},
        attempt::{Attempt, AttemptWithAnswers},
        course::CourseActivity,
        grade::{Grade, GradeUpdate, GradeWeights},
        quiz::QuizDefinition,
    },
    services::scoring::Scorecard,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Everything written onto an attempt when it is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub submitted_at: DateTime<Utc>,
    pub time_spent_seconds: i32,
    pub scorecard: Scorecard,
}

/// Builds the submission from the locked attempt and its answers.
pub type Finalizer<'a> = dyn Fn(&Attempt, &[Answer]) -> SubmissionRecord + Send + Sync + 'a;

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Quiz with its ordered questions and options.
    async fn quiz(&self, quiz_id: i64) -> AssessmentResult<Option<QuizDefinition>>;

    async fn attempt(&self, attempt_id: i64) -> AssessmentResult<Option<AttemptWithAnswers>>;

    /// All attempts of a user on a quiz, ordered by attempt number.
    async fn attempts(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Vec<Attempt>>;

    async fn count_submitted(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<i64>;

    /// Inserts the next attempt for (user, quiz).
    ///
    /// Under a lock scoped to (user, quiz): fails with `AttemptInProgress` if
    /// an unsubmitted attempt exists, and with `AttemptLimitExceeded` if
    /// `limit` submitted attempts already exist.
    async fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        limit: Option<i32>,
        started_at: DateTime<Utc>,
    ) -> AssessmentResult<Attempt>;

    /// Upserts the answer keyed by (attempt, question) and clears `correct`.
    ///
    /// Fails with `AlreadySubmitted` once the attempt is submitted. Writes to
    /// different questions of one attempt do not exclude each other.
    async fn upsert_answer(&self, draft: AnswerDraft) -> AssessmentResult<Answer>;

    /// Locks the attempt, runs `finalize` over it and its answers, and writes
    /// the counts, answer marks and `submitted_at` in one step.
    ///
    /// At most one caller per attempt gets past the lock; every other caller
    /// sees `AlreadySubmitted`.
    async fn submit_attempt(
        &self,
        attempt_id: i64,
        finalize: &Finalizer<'_>,
    ) -> AssessmentResult<(Attempt, SubmissionRecord)>;
}

#[async_trait]
pub trait GradeStore: Send + Sync {
    /// Published quizzes/assignments/lessons of the course with the user's results.
    async fn course_activity(&self, user_id: i64, course_id: i64)
    -> AssessmentResult<CourseActivity>;

    async fn grade(&self, user_id: i64, course_id: i64) -> AssessmentResult<Option<Grade>>;

    /// Returns the existing row, or inserts one with `weights`.
    async fn create_grade(
        &self,
        user_id: i64,
        course_id: i64,
        weights: GradeWeights,
    ) -> AssessmentResult<Grade>;

    async fn update_weights(&self, grade_id: i64, weights: GradeWeights) -> AssessmentResult<Grade>;

    async fn save_grade(
        &self,
        grade_id: i64,
        update: &GradeUpdate,
        calculated_at: DateTime<Utc>,
    ) -> AssessmentResult<Grade>;

    /// (user, course) pairs with any graded activity, optionally for one course.
    async fn active_pairs(&self, course_id: Option<i64>) -> AssessmentResult<Vec<(i64, i64)>>;
}
