// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::{AssessmentError, AssessmentResult},
    models::{
        answer::{Answer, AnswerDraft},
        attempt::{Attempt, AttemptWithAnswers},
        course::{
            AssignmentActivity, AttemptScore, CourseActivity, QuizActivity, SubmissionScore,
            SubmissionStatus,
        },
        grade::{Grade, GradeUpdate, GradeWeights},
        question::{Question, QuestionKind, QuestionOption},
        quiz::{QuizDefinition, QuizSettings},
    },
    store::{AttemptStore, Finalizer, GradeStore, SubmissionRecord},
};

const ANSWERS_OF_ATTEMPT: &str = r#"
    SELECT id, attempt_id, question_id, option_id, user_answer, correct
    FROM attempt_answers
    WHERE attempt_id = $1
    ORDER BY id
"#;

/// Helper struct for the 'quizzes' table.
#[derive(FromRow)]
struct QuizRow {
    id: i64,
    course_id: i64,
    title: String,
    is_published: bool,
    attempts_allowed: Option<i32>,
    total_duration_minutes: Option<i32>,
    per_question_duration_seconds: Option<i32>,
    shuffle_questions: bool,
    shuffle_options: bool,
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    #[sqlx(rename = "type")]
    question_type: String,
    content: String,
    correct_answer: Option<String>,
    position: i32,
}

#[derive(FromRow)]
struct OptionRow {
    id: i64,
    question_id: i64,
    text: String,
    is_correct: bool,
}

/// Counters read under the (user, quiz) lock before inserting an attempt.
#[derive(FromRow)]
struct AttemptCounters {
    last_number: i32,
    submitted: i64,
    open_attempt: Option<i64>,
}

#[derive(FromRow)]
struct QuizQuestionCount {
    quiz_id: i64,
    question_count: i64,
}

#[derive(FromRow)]
struct SubmittedScore {
    quiz_id: i64,
    correct_count: Option<i32>,
    total_questions: Option<i32>,
}

#[derive(FromRow)]
struct AssignmentRow {
    id: i64,
    max_points: f64,
}

#[derive(FromRow)]
struct SubmissionRow {
    assignment_id: i64,
    status: String,
    final_score: Option<f64>,
    ai_score: Option<f64>,
}

#[derive(FromRow)]
struct LessonCounts {
    published: i64,
    completed: i64,
}

/// Store backed by Postgres.
///
/// * `create_attempt` serializes on a `quiz_attempt_locks` row per (user, quiz).
/// * `submit_attempt` holds `FOR UPDATE` on the attempt and only updates rows
///   still unsubmitted.
/// * `upsert_answer` takes `FOR SHARE`, so answer writes run side by side but
///   wait for a concurrent submit.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a validated quiz and returns it with database-assigned ids.
    pub async fn insert_quiz(&self, quiz: &QuizDefinition) -> AssessmentResult<QuizDefinition> {
        quiz.validate()?;

        let mut tx = self.pool.begin().await?;

        let (quiz_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO quizzes (course_id, title, is_published, attempts_allowed,
                total_duration_minutes, per_question_duration_seconds,
                shuffle_questions, shuffle_options)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(quiz.course_id)
        .bind(&quiz.title)
        .bind(quiz.is_published)
        .bind(quiz.settings.attempts_allowed)
        .bind(quiz.settings.total_duration_minutes)
        .bind(quiz.settings.per_question_duration_seconds)
        .bind(quiz.settings.shuffle_questions)
        .bind(quiz.settings.shuffle_options)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(quiz.questions.len());
        for question in &quiz.questions {
            let (question_id,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO questions (quiz_id, type, content, correct_answer, position)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(quiz_id)
            .bind(question.kind.as_str())
            .bind(&question.content)
            .bind(&question.correct_answer)
            .bind(question.position)
            .fetch_one(&mut *tx)
            .await?;

            let mut options = Vec::with_capacity(question.options.len());
            for (position, option) in question.options.iter().enumerate() {
                let (option_id,): (i64,) = sqlx::query_as(
                    r#"
                    INSERT INTO question_options (question_id, text, is_correct, position)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(question_id)
                .bind(&option.text)
                .bind(option.is_correct)
                .bind(position as i32)
                .fetch_one(&mut *tx)
                .await?;

                options.push(QuestionOption {
                    id: option_id,
                    question_id,
                    ..option.clone()
                });
            }

            questions.push(Question {
                id: question_id,
                quiz_id,
                options,
                ..question.clone()
            });
        }

        tx.commit().await?;
        tracing::info!("Inserted quiz {} with {} questions", quiz_id, questions.len());

        Ok(QuizDefinition {
            id: quiz_id,
            questions,
            ..quiz.clone()
        })
    }
}

fn decode_kind(raw: &str) -> AssessmentResult<QuestionKind> {
    raw.parse::<QuestionKind>().map_err(|e| {
        tracing::error!("Unreadable question row: {}", e);
        AssessmentError::Storage(sqlx::Error::Decode(Box::new(e)))
    })
}

#[async_trait]
impl AttemptStore for PgStore {
    async fn quiz(&self, quiz_id: i64) -> AssessmentResult<Option<QuizDefinition>> {
        let quiz = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, course_id, title, is_published, attempts_allowed,
                total_duration_minutes, per_question_duration_seconds,
                shuffle_questions, shuffle_options
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(quiz) = quiz else {
            return Ok(None);
        };

        let question_rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, quiz_id, type, content, correct_answer, position
            FROM questions
            WHERE quiz_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let option_rows = sqlx::query_as::<_, OptionRow>(
            r#"
            SELECT o.id, o.question_id, o.text, o.is_correct
            FROM question_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.quiz_id = $1
            ORDER BY o.position, o.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut options: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
        for row in option_rows {
            options.entry(row.question_id).or_default().push(QuestionOption {
                id: row.id,
                question_id: row.question_id,
                text: row.text,
                is_correct: row.is_correct,
            });
        }

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in question_rows {
            questions.push(Question {
                id: row.id,
                quiz_id: row.quiz_id,
                kind: decode_kind(&row.question_type)?,
                content: row.content,
                options: options.remove(&row.id).unwrap_or_default(),
                correct_answer: row.correct_answer,
                position: row.position,
            });
        }

        Ok(Some(QuizDefinition {
            id: quiz.id,
            course_id: quiz.course_id,
            title: quiz.title,
            is_published: quiz.is_published,
            settings: QuizSettings {
                attempts_allowed: quiz.attempts_allowed,
                total_duration_minutes: quiz.total_duration_minutes,
                per_question_duration_seconds: quiz.per_question_duration_seconds,
                shuffle_questions: quiz.shuffle_questions,
                shuffle_options: quiz.shuffle_options,
            },
            questions,
        }))
    }

    async fn attempt(&self, attempt_id: i64) -> AssessmentResult<Option<AttemptWithAnswers>> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            SELECT id, user_id, quiz_id, attempt_number, started_at, submitted_at,
                correct_count, wrong_count, total_questions, time_spent_seconds
            FROM quiz_attempts
            WHERE id = $1
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
            .await?;

        let Some(attempt) = attempt else {
            return Ok(None);
        };

        let answers = sqlx::query_as::<_, Answer>(ANSWERS_OF_ATTEMPT)
            .bind(attempt_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(AttemptWithAnswers { attempt, answers }))
    }

    async fn attempts(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Vec<Attempt>> {
        let attempts = sqlx::query_as::<_, Attempt>(
            r#"
            SELECT id, user_id, quiz_id, attempt_number, started_at, submitted_at,
                correct_count, wrong_count, total_questions, time_spent_seconds
            FROM quiz_attempts
            WHERE user_id = $1 AND quiz_id = $2
            ORDER BY attempt_number
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn count_submitted(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM quiz_attempts
            WHERE user_id = $1 AND quiz_id = $2 AND submitted_at IS NOT NULL
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        limit: Option<i32>,
        started_at: DateTime<Utc>,
    ) -> AssessmentResult<Attempt> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quiz_attempt_locks (user_id, quiz_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("SELECT 1 FROM quiz_attempt_locks WHERE user_id = $1 AND quiz_id = $2 FOR UPDATE")
            .bind(user_id)
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?;

        let counters = sqlx::query_as::<_, AttemptCounters>(
            r#"
            SELECT
                COALESCE(MAX(attempt_number), 0) AS last_number,
                COUNT(*) FILTER (WHERE submitted_at IS NOT NULL) AS submitted,
                MIN(id) FILTER (WHERE submitted_at IS NULL) AS open_attempt
            FROM quiz_attempts
            WHERE user_id = $1 AND quiz_id = $2
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(attempt_id) = counters.open_attempt {
            return Err(AssessmentError::AttemptInProgress { attempt_id, quiz_id });
        }
        if let Some(allowed) = limit {
            if counters.submitted >= i64::from(allowed) {
                return Err(AssessmentError::AttemptLimitExceeded { quiz_id, allowed });
            }
        }

        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO quiz_attempts (user_id, quiz_id, attempt_number, started_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, quiz_id, attempt_number, started_at, submitted_at,
                correct_count, wrong_count, total_questions, time_spent_seconds
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .bind(counters.last_number + 1)
        .bind(started_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attempt)
    }

    async fn upsert_answer(&self, draft: AnswerDraft) -> AssessmentResult<Answer> {
        let mut tx = self.pool.begin().await?;

        let status: Option<(Option<DateTime<Utc>>,)> =
            sqlx::query_as("SELECT submitted_at FROM quiz_attempts WHERE id = $1 FOR SHARE")
                .bind(draft.attempt_id)
                .fetch_optional(&mut *tx)
                .await?;

        match status {
            None => return Err(AssessmentError::AttemptNotFound(draft.attempt_id)),
            Some((Some(_),)) => return Err(AssessmentError::AlreadySubmitted(draft.attempt_id)),
            Some((None,)) => {}
        }

        let answer = sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO attempt_answers (attempt_id, question_id, option_id, user_answer, correct)
            VALUES ($1, $2, $3, $4, NULL)
            ON CONFLICT (attempt_id, question_id) DO UPDATE SET
                option_id = EXCLUDED.option_id,
                user_answer = EXCLUDED.user_answer,
                correct = NULL,
                updated_at = NOW()
            RETURNING id, attempt_id, question_id, option_id, user_answer, correct
            "#,
        )
        .bind(draft.attempt_id)
        .bind(draft.question_id)
        .bind(draft.option_id)
        .bind(&draft.user_answer)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(answer)
    }

    async fn submit_attempt(
        &self,
        attempt_id: i64,
        finalize: &Finalizer<'_>,
    ) -> AssessmentResult<(Attempt, SubmissionRecord)> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            SELECT id, user_id, quiz_id, attempt_number, started_at, submitted_at,
                correct_count, wrong_count, total_questions, time_spent_seconds
            FROM quiz_attempts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AssessmentError::AttemptNotFound(attempt_id))?;

        if attempt.is_submitted() {
            return Err(AssessmentError::AlreadySubmitted(attempt_id));
        }

        let answers = sqlx::query_as::<_, Answer>(ANSWERS_OF_ATTEMPT)
            .bind(attempt_id)
            .fetch_all(&mut *tx)
            .await?;

        let record = finalize(&attempt, &answers);

        let (ids, marks): (Vec<i64>, Vec<bool>) = record.scorecard.marks.iter().copied().unzip();
        sqlx::query(
            r#"
            UPDATE attempt_answers AS a
            SET correct = m.correct, updated_at = NOW()
            FROM UNNEST($1::BIGINT[], $2::BOOLEAN[]) AS m(id, correct)
            WHERE a.id = m.id
            "#,
        )
        .bind(&ids)
        .bind(&marks)
        .execute(&mut *tx)
        .await?;

        let submitted = sqlx::query_as::<_, Attempt>(
            r#"
            UPDATE quiz_attempts
            SET submitted_at = $2, correct_count = $3, wrong_count = $4,
                total_questions = $5, time_spent_seconds = $6
            WHERE id = $1 AND submitted_at IS NULL
            RETURNING id, user_id, quiz_id, attempt_number, started_at, submitted_at,
                correct_count, wrong_count, total_questions, time_spent_seconds
            "#,
        )
        .bind(attempt_id)
        .bind(record.submitted_at)
        .bind(record.scorecard.correct_count)
        .bind(record.scorecard.wrong_count)
        .bind(record.scorecard.total_questions)
        .bind(record.time_spent_seconds)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AssessmentError::AlreadySubmitted(attempt_id))?;

        tx.commit().await?;
        Ok((submitted, record))
    }
}

#[async_trait]
impl GradeStore for PgStore {
    async fn course_activity(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> AssessmentResult<CourseActivity> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let quiz_rows = sqlx::query_as::<_, QuizQuestionCount>(
            r#"
            SELECT q.id AS quiz_id,
                (SELECT COUNT(*) FROM questions qs WHERE qs.quiz_id = q.id) AS question_count
            FROM quizzes q
            WHERE q.course_id = $1 AND q.is_published
            ORDER BY q.id
            "#,
        )
        .bind(course_id)
        .fetch_all(&mut *tx)
        .await?;

        let score_rows = sqlx::query_as::<_, SubmittedScore>(
            r#"
            SELECT a.quiz_id, a.correct_count, a.total_questions
            FROM quiz_attempts a
            JOIN quizzes q ON q.id = a.quiz_id
            WHERE q.course_id = $1 AND q.is_published
              AND a.user_id = $2 AND a.submitted_at IS NOT NULL
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let assignment_rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT id, max_points FROM assignments WHERE course_id = $1 AND is_published ORDER BY id",
        )
        .bind(course_id)
        .fetch_all(&mut *tx)
        .await?;

        let submission_rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT s.assignment_id, s.status, s.final_score, s.ai_score
            FROM assignment_submissions s
            JOIN assignments a ON a.id = s.assignment_id
            WHERE a.course_id = $1 AND a.is_published AND s.user_id = $2
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let lessons = sqlx::query_as::<_, LessonCounts>(
            r#"
            SELECT COUNT(l.id) AS published, COUNT(c.user_id) AS completed
            FROM lessons l
            LEFT JOIN lesson_completions c ON c.lesson_id = l.id AND c.user_id = $2
            WHERE l.course_id = $1 AND l.is_published
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let current_counts: HashMap<i64, i64> = quiz_rows
            .iter()
            .map(|row| (row.quiz_id, row.question_count))
            .collect();
        let mut scores: HashMap<i64, Vec<AttemptScore>> = HashMap::new();
        for row in score_rows {
            let Some(correct_count) = row.correct_count else {
                continue;
            };
            let total_questions = row.total_questions.unwrap_or_else(|| {
                current_counts.get(&row.quiz_id).copied().unwrap_or_default() as i32
            });
            scores.entry(row.quiz_id).or_default().push(AttemptScore {
                correct_count,
                total_questions,
            });
        }

        let mut submissions: HashMap<i64, Vec<SubmissionScore>> = HashMap::new();
        for row in submission_rows {
            let Some(status) = SubmissionStatus::parse(&row.status) else {
                tracing::warn!(
                    "Skipping submission for assignment {} with unknown status '{}'",
                    row.assignment_id,
                    row.status
                );
                continue;
            };
            submissions.entry(row.assignment_id).or_default().push(SubmissionScore {
                status,
                final_score: row.final_score,
                ai_score: row.ai_score,
            });
        }

        Ok(CourseActivity {
            quizzes: quiz_rows
                .into_iter()
                .map(|row| QuizActivity {
                    quiz_id: row.quiz_id,
                    question_count: row.question_count,
                    submitted_scores: scores.remove(&row.quiz_id).unwrap_or_default(),
                })
                .collect(),
            assignments: assignment_rows
                .into_iter()
                .map(|row| AssignmentActivity {
                    assignment_id: row.id,
                    max_points: row.max_points,
                    submissions: submissions.remove(&row.id).unwrap_or_default(),
                })
                .collect(),
            published_lessons: lessons.published,
            completed_lessons: lessons.completed,
        })
    }

    async fn grade(&self, user_id: i64, course_id: i64) -> AssessmentResult<Option<Grade>> {
        let grade = sqlx::query_as::<_, Grade>(
            r#"
            SELECT id, user_id, course_id, quiz_average, assignment_average,
                participation_score, final_grade, quiz_weight, assignment_weight,
                participation_weight, total_quizzes, completed_quizzes, total_assignments,
                completed_assignments, calculated_at
            FROM grades
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(grade)
    }

    async fn create_grade(
        &self,
        user_id: i64,
        course_id: i64,
        weights: GradeWeights,
    ) -> AssessmentResult<Grade> {
        sqlx::query(
            r#"
            INSERT INTO grades (user_id, course_id, quiz_weight, assignment_weight, participation_weight)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(weights.quiz)
        .bind(weights.assignment)
        .bind(weights.participation)
        .execute(&self.pool)
        .await?;

        self.grade(user_id, course_id)
            .await?
            .ok_or(AssessmentError::Storage(sqlx::Error::RowNotFound))
    }

    async fn update_weights(&self, grade_id: i64, weights: GradeWeights) -> AssessmentResult<Grade> {
        let grade = sqlx::query_as::<_, Grade>(
            r#"
            UPDATE grades
            SET quiz_weight = $2, assignment_weight = $3, participation_weight = $4
            WHERE id = $1
            RETURNING id, user_id, course_id, quiz_average, assignment_average,
                participation_score, final_grade, quiz_weight, assignment_weight,
                participation_weight, total_quizzes, completed_quizzes, total_assignments,
                completed_assignments, calculated_at
            "#,
        )
        .bind(grade_id)
        .bind(weights.quiz)
        .bind(weights.assignment)
        .bind(weights.participation)
        .fetch_one(&self.pool)
        .await?;
        Ok(grade)
    }

    async fn save_grade(
        &self,
        grade_id: i64,
        update: &GradeUpdate,
        calculated_at: DateTime<Utc>,
    ) -> AssessmentResult<Grade> {
        let grade = sqlx::query_as::<_, Grade>(
            r#"
            UPDATE grades
            SET quiz_average = $2, assignment_average = $3, participation_score = $4,
                final_grade = $5, total_quizzes = $6, completed_quizzes = $7,
                total_assignments = $8, completed_assignments = $9, calculated_at = $10
            WHERE id = $1
            RETURNING id, user_id, course_id, quiz_average, assignment_average,
                participation_score, final_grade, quiz_weight, assignment_weight,
                participation_weight, total_quizzes, completed_quizzes, total_assignments,
                completed_assignments, calculated_at
            "#,
        )
        .bind(grade_id)
        .bind(update.quiz_average)
        .bind(update.assignment_average)
        .bind(update.participation_score)
        .bind(update.final_grade)
        .bind(update.total_quizzes)
        .bind(update.completed_quizzes)
        .bind(update.total_assignments)
        .bind(update.completed_assignments)
        .bind(calculated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(grade)
    }

    async fn active_pairs(&self, course_id: Option<i64>) -> AssessmentResult<Vec<(i64, i64)>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT user_id, course_id FROM (
                SELECT a.user_id, q.course_id
                FROM quiz_attempts a JOIN quizzes q ON q.id = a.quiz_id
                UNION
                SELECT s.user_id, asg.course_id
                FROM assignment_submissions s JOIN assignments asg ON asg.id = s.assignment_id
                UNION
                SELECT c.user_id, l.course_id
                FROM lesson_completions c JOIN lessons l ON l.id = c.lesson_id
                UNION
                SELECT user_id, course_id FROM grades
            ) pairs
            "#,
        );

        if let Some(course_id) = course_id {
            builder.push(" WHERE course_id = ");
            builder.push_bind(course_id);
        }
        builder.push(" ORDER BY user_id, course_id");

        let pairs = builder
            .build_query_as::<(i64, i64)>()
            .fetch_all(&self.pool)
            .await?;
        Ok(pairs)
    }
}
