// src/store/memory.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use validator::Validate;

use crate::{
    error::{AssessmentError, AssessmentResult},
    models::{
        answer::{Answer, AnswerDraft},
        attempt::{Attempt, AttemptWithAnswers},
        course::{AssignmentActivity, AttemptScore, CourseActivity, QuizActivity, SubmissionScore},
        grade::{Grade, GradeUpdate, GradeWeights},
        quiz::QuizDefinition,
    },
    store::{AttemptStore, Finalizer, GradeStore, SubmissionRecord},
};

#[derive(Debug, Clone)]
struct AssignmentRow {
    course_id: i64,
    max_points: f64,
    is_published: bool,
}

#[derive(Debug, Clone)]
struct LessonRow {
    course_id: i64,
    is_published: bool,
}

#[derive(Debug, Default)]
struct State {
    quizzes: BTreeMap<i64, QuizDefinition>,
    attempts: BTreeMap<i64, Attempt>,
    answers: BTreeMap<i64, Answer>,
    assignments: BTreeMap<i64, AssignmentRow>,
    /// (user_id, assignment_id) -> submissions
    submissions: HashMap<(i64, i64), Vec<SubmissionScore>>,
    lessons: BTreeMap<i64, LessonRow>,
    completions: BTreeSet<(i64, i64)>,
    grades: BTreeMap<(i64, i64), Grade>,
    next_attempt_id: i64,
    next_answer_id: i64,
    next_grade_id: i64,
}

impl State {
    fn answers_of(&self, attempt_id: i64) -> Vec<Answer> {
        self.answers
            .values()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect()
    }

    fn attempts_of(&self, user_id: i64, quiz_id: i64) -> impl Iterator<Item = &Attempt> {
        self.attempts
            .values()
            .filter(move |a| a.user_id == user_id && a.quiz_id == quiz_id)
    }
}

/// Store backed by process memory.
///
/// A single mutex serializes every operation, which gives the same
/// at-most-once guarantees as the row locks in `PgStore`. Also stands in for
/// the course, assignment and lesson subsystems through its seeding methods.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a quiz after checking its definition.
    pub async fn add_quiz(&self, quiz: QuizDefinition) -> AssessmentResult<()> {
        quiz.validate()?;
        self.state.lock().await.quizzes.insert(quiz.id, quiz);
        Ok(())
    }

    /// Replaces a quiz without validation, as a later edit would.
    pub async fn replace_quiz(&self, quiz: QuizDefinition) {
        self.state.lock().await.quizzes.insert(quiz.id, quiz);
    }

    pub async fn add_assignment(
        &self,
        course_id: i64,
        assignment_id: i64,
        max_points: f64,
        is_published: bool,
    ) {
        self.state.lock().await.assignments.insert(
            assignment_id,
            AssignmentRow {
                course_id,
                max_points,
                is_published,
            },
        );
    }

    pub async fn add_submission(&self, user_id: i64, assignment_id: i64, score: SubmissionScore) {
        self.state
            .lock()
            .await
            .submissions
            .entry((user_id, assignment_id))
            .or_default()
            .push(score);
    }

    pub async fn add_lesson(&self, course_id: i64, lesson_id: i64, is_published: bool) {
        self.state.lock().await.lessons.insert(
            lesson_id,
            LessonRow {
                course_id,
                is_published,
            },
        );
    }

    pub async fn complete_lesson(&self, user_id: i64, lesson_id: i64) {
        self.state.lock().await.completions.insert((user_id, lesson_id));
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn quiz(&self, quiz_id: i64) -> AssessmentResult<Option<QuizDefinition>> {
        Ok(self.state.lock().await.quizzes.get(&quiz_id).cloned())
    }

    async fn attempt(&self, attempt_id: i64) -> AssessmentResult<Option<AttemptWithAnswers>> {
        let state = self.state.lock().await;
        Ok(state.attempts.get(&attempt_id).map(|attempt| AttemptWithAnswers {
            attempt: attempt.clone(),
            answers: state.answers_of(attempt_id),
        }))
    }

    async fn attempts(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<Vec<Attempt>> {
        let state = self.state.lock().await;
        let mut attempts: Vec<Attempt> = state.attempts_of(user_id, quiz_id).cloned().collect();
        attempts.sort_by_key(|a| a.attempt_number);
        Ok(attempts)
    }

    async fn count_submitted(&self, user_id: i64, quiz_id: i64) -> AssessmentResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .attempts_of(user_id, quiz_id)
            .filter(|a| a.is_submitted())
            .count() as i64)
    }

    async fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        limit: Option<i32>,
        started_at: DateTime<Utc>,
    ) -> AssessmentResult<Attempt> {
        let mut state = self.state.lock().await;

        if !state.quizzes.contains_key(&quiz_id) {
            return Err(AssessmentError::QuizNotFound(quiz_id));
        }

        if let Some(open) = state.attempts_of(user_id, quiz_id).find(|a| !a.is_submitted()) {
            return Err(AssessmentError::AttemptInProgress {
                attempt_id: open.id,
                quiz_id,
            });
        }

        if let Some(allowed) = limit {
            let submitted = state
                .attempts_of(user_id, quiz_id)
                .filter(|a| a.is_submitted())
                .count();
            if submitted >= allowed as usize {
                return Err(AssessmentError::AttemptLimitExceeded { quiz_id, allowed });
            }
        }

        let attempt_number = state
            .attempts_of(user_id, quiz_id)
            .map(|a| a.attempt_number)
            .max()
            .unwrap_or(0)
            + 1;

        state.next_attempt_id += 1;
        let attempt = Attempt {
            id: state.next_attempt_id,
            user_id,
            quiz_id,
            attempt_number,
            started_at,
            submitted_at: None,
            correct_count: None,
            wrong_count: None,
            total_questions: None,
            time_spent_seconds: None,
        };
        state.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn upsert_answer(&self, draft: AnswerDraft) -> AssessmentResult<Answer> {
        let mut state = self.state.lock().await;

        let attempt = state
            .attempts
            .get(&draft.attempt_id)
            .ok_or(AssessmentError::AttemptNotFound(draft.attempt_id))?;
        if attempt.is_submitted() {
            return Err(AssessmentError::AlreadySubmitted(attempt.id));
        }

        let existing = state
            .answers
            .values()
            .find(|a| a.attempt_id == draft.attempt_id && a.question_id == draft.question_id)
            .map(|a| a.id);
        let id = match existing {
            Some(id) => id,
            None => {
                state.next_answer_id += 1;
                state.next_answer_id
            }
        };

        let answer = Answer {
            id,
            attempt_id: draft.attempt_id,
            question_id: draft.question_id,
            option_id: draft.option_id,
            user_answer: draft.user_answer,
            correct: None,
        };
        state.answers.insert(id, answer.clone());
        Ok(answer)
    }

    async fn submit_attempt(
        &self,
        attempt_id: i64,
        finalize: &Finalizer<'_>,
    ) -> AssessmentResult<(Attempt, SubmissionRecord)> {
        let mut state = self.state.lock().await;

        let attempt = state
            .attempts
            .get(&attempt_id)
            .cloned()
            .ok_or(AssessmentError::AttemptNotFound(attempt_id))?;
        if attempt.is_submitted() {
            return Err(AssessmentError::AlreadySubmitted(attempt_id));
        }

        let answers = state.answers_of(attempt_id);
        let record = finalize(&attempt, &answers);

        for (answer_id, correct) in &record.scorecard.marks {
            if let Some(answer) = state.answers.get_mut(answer_id) {
                answer.correct = Some(*correct);
            }
        }

        let submitted = Attempt {
            submitted_at: Some(record.submitted_at),
            correct_count: Some(record.scorecard.correct_count),
            wrong_count: Some(record.scorecard.wrong_count),
            total_questions: Some(record.scorecard.total_questions),
            time_spent_seconds: Some(record.time_spent_seconds),
            ..attempt
        };
        state.attempts.insert(attempt_id, submitted.clone());
        Ok((submitted, record))
    }
}

#[async_trait]
impl GradeStore for MemoryStore {
    async fn course_activity(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> AssessmentResult<CourseActivity> {
        let state = self.state.lock().await;

        let quizzes = state
            .quizzes
            .values()
            .filter(|q| q.course_id == course_id && q.is_published)
            .map(|q| QuizActivity {
                quiz_id: q.id,
                question_count: q.question_count() as i64,
                submitted_scores: state
                    .attempts_of(user_id, q.id)
                    .filter(|a| a.is_submitted())
                    .filter_map(|a| {
                        Some(AttemptScore {
                            correct_count: a.correct_count?,
                            total_questions: a
                                .total_questions
                                .unwrap_or(q.question_count() as i32),
                        })
                    })
                    .collect(),
            })
            .collect();

        let assignments = state
            .assignments
            .iter()
            .filter(|(_, a)| a.course_id == course_id && a.is_published)
            .map(|(&assignment_id, a)| AssignmentActivity {
                assignment_id,
                max_points: a.max_points,
                submissions: state
                    .submissions
                    .get(&(user_id, assignment_id))
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        let published: Vec<i64> = state
            .lessons
            .iter()
            .filter(|(_, l)| l.course_id == course_id && l.is_published)
            .map(|(&id, _)| id)
            .collect();
        let completed = published
            .iter()
            .filter(|id| state.completions.contains(&(user_id, **id)))
            .count();

        Ok(CourseActivity {
            quizzes,
            assignments,
            published_lessons: published.len() as i64,
            completed_lessons: completed as i64,
        })
    }

    async fn grade(&self, user_id: i64, course_id: i64) -> AssessmentResult<Option<Grade>> {
        Ok(self.state.lock().await.grades.get(&(user_id, course_id)).cloned())
    }

    async fn create_grade(
        &self,
        user_id: i64,
        course_id: i64,
        weights: GradeWeights,
    ) -> AssessmentResult<Grade> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.grades.get(&(user_id, course_id)) {
            return Ok(existing.clone());
        }
        state.next_grade_id += 1;
        let grade = Grade {
            id: state.next_grade_id,
            user_id,
            course_id,
            quiz_average: None,
            assignment_average: None,
            participation_score: None,
            final_grade: None,
            quiz_weight: weights.quiz,
            assignment_weight: weights.assignment,
            participation_weight: weights.participation,
            total_quizzes: 0,
            completed_quizzes: 0,
            total_assignments: 0,
            completed_assignments: 0,
            calculated_at: None,
        };
        state.grades.insert((user_id, course_id), grade.clone());
        Ok(grade)
    }

    async fn update_weights(&self, grade_id: i64, weights: GradeWeights) -> AssessmentResult<Grade> {
        let mut state = self.state.lock().await;
        let grade = state
            .grades
            .values_mut()
            .find(|g| g.id == grade_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        grade.quiz_weight = weights.quiz;
        grade.assignment_weight = weights.assignment;
        grade.participation_weight = weights.participation;
        Ok(grade.clone())
    }

    async fn save_grade(
        &self,
        grade_id: i64,
        update: &GradeUpdate,
        calculated_at: DateTime<Utc>,
    ) -> AssessmentResult<Grade> {
        let mut state = self.state.lock().await;
        let grade = state
            .grades
            .values_mut()
            .find(|g| g.id == grade_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        grade.quiz_average = update.quiz_average;
        grade.assignment_average = update.assignment_average;
        grade.participation_score = update.participation_score;
        grade.final_grade = update.final_grade;
        grade.total_quizzes = update.total_quizzes;
        grade.completed_quizzes = update.completed_quizzes;
        grade.total_assignments = update.total_assignments;
        grade.completed_assignments = update.completed_assignments;
        grade.calculated_at = Some(calculated_at);
        Ok(grade.clone())
    }

    async fn active_pairs(&self, course_id: Option<i64>) -> AssessmentResult<Vec<(i64, i64)>> {
        let state = self.state.lock().await;
        let wanted = |course: i64| course_id.is_none_or(|c| c == course);
        let mut pairs = BTreeSet::new();

        for attempt in state.attempts.values() {
            if let Some(quiz) = state.quizzes.get(&attempt.quiz_id) {
                if wanted(quiz.course_id) {
                    pairs.insert((attempt.user_id, quiz.course_id));
                }
            }
        }
        for &(user_id, assignment_id) in state.submissions.keys() {
            if let Some(assignment) = state.assignments.get(&assignment_id) {
                if wanted(assignment.course_id) {
                    pairs.insert((user_id, assignment.course_id));
                }
            }
        }
        for &(user_id, lesson_id) in &state.completions {
            if let Some(lesson) = state.lessons.get(&lesson_id) {
                if wanted(lesson.course_id) {
                    pairs.insert((user_id, lesson.course_id));
                }
            }
        }
        for &(user_id, course) in state.grades.keys() {
            if wanted(course) {
                pairs.insert((user_id, course));
            }
        }

        Ok(pairs.into_iter().collect())
    }
}
