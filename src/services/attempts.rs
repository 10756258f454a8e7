// src/services/attempts.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{AssessmentError, AssessmentResult},
    events::{AssessmentEvent, EventBus},
    models::{
        answer::{Answer, AnswerDraft, AnswerInput},
        attempt::{Attempt, AttemptWithAnswers},
        question::QuestionKind,
        quiz::QuizDefinition,
    },
    services::scoring::{self, Scorecard},
    store::{AttemptStore, SubmissionRecord},
    utils::selection::parse_selection,
};

/// Source of "now". Tests inject a fixed or stepping clock.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// What `submit` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub attempt: Attempt,
    pub scorecard: Scorecard,
    /// Set when the soft time limit was exceeded. The submission still counts.
    pub over_time_limit: bool,
}

/// Owns the attempt lifecycle: NotStarted -> InProgress -> Submitted.
pub struct AttemptManager {
    store: Arc<dyn AttemptStore>,
    events: EventBus,
    clock: Clock,
}

impl AttemptManager {
    pub fn new(store: Arc<dyn AttemptStore>, events: EventBus) -> Self {
        Self {
            store,
            events,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn load_quiz(&self, quiz_id: i64) -> AssessmentResult<QuizDefinition> {
        self.store
            .quiz(quiz_id)
            .await?
            .ok_or(AssessmentError::QuizNotFound(quiz_id))
    }

    /// Loads an attempt owned by `user_id`. Other users' attempts are reported as missing.
    async fn load_attempt(&self, user_id: i64, attempt_id: i64) -> AssessmentResult<AttemptWithAnswers> {
        match self.store.attempt(attempt_id).await? {
            Some(found) if found.attempt.user_id == user_id => Ok(found),
            _ => Err(AssessmentError::AttemptNotFound(attempt_id)),
        }
    }

    /// True when the quiz is unlimited or fewer than `attempts_allowed` attempts were submitted.
    /// In-progress attempts do not count.
    pub async fn can_attempt(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<bool> {
        let quiz = self.load_quiz(quiz_id).await?;
        let Some(limit) = quiz.settings.attempt_limit() else {
            return Ok(true);
        };
        let submitted = self.store.count_submitted(user_id, quiz_id).await?;
        Ok(submitted < i64::from(limit))
    }

    /// Starts the next attempt.
    ///
    /// The limit check and the insert happen atomically in the store, so
    /// concurrent starts cannot exceed `attempts_allowed`.
    pub async fn start(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Attempt> {
        let quiz = self.load_quiz(quiz_id).await?;
        let started_at = (self.clock)();

        let attempt = self
            .store
            .create_attempt(user_id, quiz_id, quiz.settings.attempt_limit(), started_at)
            .await
            .inspect_err(|e| {
                if let AssessmentError::AttemptLimitExceeded { allowed, .. } = e {
                    tracing::info!(
                        "User {} exhausted {} attempts on quiz {}",
                        user_id,
                        allowed,
                        quiz_id
                    );
                }
            })?;

        tracing::info!(
            "User {} started attempt #{} ({}) on quiz {}",
            user_id,
            attempt.attempt_number,
            attempt.id,
            quiz_id
        );
        Ok(attempt)
    }

    pub async fn get_in_progress(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Option<Attempt>> {
        let attempts = self.store.attempts(user_id, quiz_id).await?;
        Ok(attempts.into_iter().find(|a| !a.is_submitted()))
    }

    /// Resumes the open attempt, or starts a new one.
    pub async fn get_or_start(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Attempt> {
        if let Some(open) = self.get_in_progress(user_id, quiz_id).await? {
            return Ok(open);
        }
        match self.start(user_id, quiz_id).await {
            // Lost a race with a concurrent start; resume the winner's attempt.
            Err(AssessmentError::AttemptInProgress { attempt_id, .. }) => self
                .load_attempt(user_id, attempt_id)
                .await
                .map(|found| found.attempt),
            other => other,
        }
    }

    /// Saves the answer to one question, replacing any earlier answer.
    /// The answer stays unscored until submission.
    pub async fn record_answer(
        &self,
        user_id: i64,
        attempt_id: i64,
        question_id: i64,
        input: AnswerInput,
    ) -> AssessmentResult<Answer> {
        let current = self.load_attempt(user_id, attempt_id).await?;
        if current.attempt.is_submitted() {
            return Err(AssessmentError::AlreadySubmitted(attempt_id));
        }

        let quiz = self.load_quiz(current.attempt.quiz_id).await?;
        let question = quiz
            .question(question_id)
            .ok_or(AssessmentError::QuestionNotInQuiz {
                question_id,
                quiz_id: quiz.id,
            })?;

        if let Some(option_id) = input.option_id {
            if !question.has_option(option_id) {
                return Err(AssessmentError::OptionNotInQuestion {
                    option_id,
                    question_id,
                });
            }
        }

        // Malformed selections are kept and score as wrong.
        if question.kind == QuestionKind::Checkbox {
            if let Some(Ok(selected)) = input.text.as_deref().map(parse_selection) {
                if let Some(&option_id) = selected.iter().find(|id| !question.has_option(**id)) {
                    return Err(AssessmentError::OptionNotInQuestion {
                        option_id,
                        question_id,
                    });
                }
            }
        }

        self.store
            .upsert_answer(AnswerDraft {
                attempt_id,
                question_id,
                option_id: input.option_id,
                user_answer: input.text,
            })
            .await
    }

    /// Scores and closes the attempt, then notifies downstream handlers.
    ///
    /// A second submit, concurrent or not, fails with `AlreadySubmitted` and
    /// leaves the stored counts untouched. Overrunning the time limit is
    /// logged and flagged but accepted.
    pub async fn submit(&self, user_id: i64, attempt_id: i64) -> AssessmentResult<SubmissionReceipt> {
        let current = self.load_attempt(user_id, attempt_id).await?;
        if current.attempt.is_submitted() {
            return Err(AssessmentError::AlreadySubmitted(attempt_id));
        }

        let quiz = self.load_quiz(current.attempt.quiz_id).await?;
        let now = (self.clock)();

        let finalize = |attempt: &Attempt, answers: &[Answer]| SubmissionRecord {
            submitted_at: now,
            time_spent_seconds: elapsed_seconds(attempt.started_at, now),
            scorecard: scoring::score(&quiz, answers),
        };
        let (attempt, record) = self.store.submit_attempt(attempt_id, &finalize).await?;

        let over_time_limit = quiz
            .time_limit_seconds()
            .is_some_and(|limit| i64::from(record.time_spent_seconds) > limit);
        if over_time_limit {
            tracing::warn!(
                "Attempt {} on quiz {} submitted after {}s, over the {}s limit; accepting",
                attempt.id,
                quiz.id,
                record.time_spent_seconds,
                quiz.time_limit_seconds().unwrap_or_default()
            );
        }

        tracing::info!(
            "Attempt {} submitted: {}/{} correct ({}%)",
            attempt.id,
            record.scorecard.correct_count,
            record.scorecard.total_questions,
            record.scorecard.percentage
        );

        self.events.publish(AssessmentEvent::AttemptSubmitted {
            user_id,
            course_id: quiz.course_id,
            quiz_id: quiz.id,
            attempt_id: attempt.id,
            correct_count: record.scorecard.correct_count,
            percentage: record.scorecard.percentage,
            over_time_limit,
        });

        Ok(SubmissionReceipt {
            attempt,
            scorecard: record.scorecard,
            over_time_limit,
        })
    }

    /// All attempts of the user on the quiz, oldest first.
    pub async fn history(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Vec<Attempt>> {
        self.store.attempts(user_id, quiz_id).await
    }

    pub async fn best_attempt(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Option<Attempt>> {
        let attempts = self.store.attempts(user_id, quiz_id).await?;
        Ok(best_of(&attempts).cloned())
    }

    pub async fn latest_attempt(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Option<Attempt>> {
        let attempts = self.store.attempts(user_id, quiz_id).await?;
        Ok(latest_of(&attempts).cloned())
    }
}

fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    let seconds = (now - started_at).num_seconds().max(0);
    i32::try_from(seconds).unwrap_or(i32::MAX)
}

/// Submitted attempt with the highest `correct_count`; the earliest wins a tie.
pub fn best_of(attempts: &[Attempt]) -> Option<&Attempt> {
    attempts
        .iter()
        .filter(|a| a.is_submitted())
        .fold(None, |best: Option<&Attempt>, a| match best {
            Some(b) if b.correct_count >= a.correct_count => Some(b),
            _ => Some(a),
        })
}

/// Most recently submitted attempt.
pub fn latest_of(attempts: &[Attempt]) -> Option<&Attempt> {
    attempts
        .iter()
        .filter(|a| a.is_submitted())
        .max_by_key(|a| (a.submitted_at, a.attempt_number))
}
