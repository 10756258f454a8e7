// src/services/grades.rs

use std::sync::Arc;

use serde::Serialize;
use validator::Validate;

use crate::{
    error::AssessmentResult,
    models::{
        course::{AssignmentActivity, AttemptScore, CourseActivity, QuizActivity, SubmissionStatus},
        grade::{Grade, GradeUpdate, GradeWeights},
    },
    services::attempts::{Clock, system_clock},
    store::GradeStore,
    utils::math::{mean, percentage, round_to},
};

/// Outcome of a bulk recalculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecalculationSummary {
    pub recalculated: usize,
    pub failed: usize,
}

/// Combines quiz, assignment and participation results into one course grade.
pub struct GradeAggregator {
    store: Arc<dyn GradeStore>,
    default_weights: GradeWeights,
    clock: Clock,
}

impl GradeAggregator {
    pub fn new(store: Arc<dyn GradeStore>, default_weights: GradeWeights) -> Self {
        Self {
            store,
            default_weights,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the grade row for (user, course), creating it with the default weights.
    pub async fn get_or_create(&self, user_id: i64, course_id: i64) -> AssessmentResult<Grade> {
        if let Some(grade) = self.store.grade(user_id, course_id).await? {
            return Ok(grade);
        }
        self.store
            .create_grade(user_id, course_id, self.default_weights)
            .await
    }

    /// Recomputes every component and the final grade in place.
    ///
    /// Idempotent: unchanged inputs produce the same values.
    pub async fn recalculate(&self, user_id: i64, course_id: i64) -> AssessmentResult<Grade> {
        let grade = self.get_or_create(user_id, course_id).await?;
        let activity = self.store.course_activity(user_id, course_id).await?;

        let update = compute(&activity, grade.weights());
        let saved = self
            .store
            .save_grade(grade.id, &update, (self.clock)())
            .await?;

        tracing::info!(
            "Recalculated grade for user {} in course {}: {:?}",
            user_id,
            course_id,
            saved.final_grade
        );
        Ok(saved)
    }

    /// Replaces the weights of one grade row and recalculates it.
    pub async fn set_weights(
        &self,
        user_id: i64,
        course_id: i64,
        weights: GradeWeights,
    ) -> AssessmentResult<Grade> {
        weights.validate()?;
        let grade = self.get_or_create(user_id, course_id).await?;
        self.store.update_weights(grade.id, weights).await?;
        self.recalculate(user_id, course_id).await
    }

    /// Recalculates every (user, course) pair with activity.
    pub async fn recalculate_all(&self, course_id: Option<i64>) -> AssessmentResult<RecalculationSummary> {
        let pairs = self.store.active_pairs(course_id).await?;
        Ok(self.recalculate_pairs(&pairs).await)
    }

    /// Recalculates the given (user, course) pairs.
    ///
    /// Failures are logged and counted; the sweep continues.
    pub async fn recalculate_pairs(&self, pairs: &[(i64, i64)]) -> RecalculationSummary {
        let mut summary = RecalculationSummary::default();

        for &(user_id, course_id) in pairs {
            match self.recalculate(user_id, course_id).await {
                Ok(_) => summary.recalculated += 1,
                Err(e) => {
                    tracing::error!(
                        "Failed to recalculate grade for user {} in course {}: {}",
                        user_id,
                        course_id,
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

/// Percentage of one attempt, measured against the questions it was scored on.
///
/// Capped at 100 so rows written before the question total was recorded stay
/// on scale when the quiz has since lost questions.
pub fn attempt_percentage(score: &AttemptScore) -> Option<f64> {
    let correct = score.correct_count.clamp(0, score.total_questions.max(0));
    percentage(f64::from(correct), f64::from(score.total_questions))
}

/// Best percentage per quiz, averaged over attempted quizzes.
///
/// Returns (average, quizzes with at least one submitted attempt).
/// Quizzes without questions are left out of the average.
pub fn quiz_average(quizzes: &[QuizActivity]) -> (Option<f64>, usize) {
    let attempted: Vec<&QuizActivity> = quizzes
        .iter()
        .filter(|q| !q.submitted_scores.is_empty())
        .collect();

    let best: Vec<f64> = attempted
        .iter()
        .filter(|q| q.question_count > 0)
        .filter_map(|q| {
            q.submitted_scores
                .iter()
                .filter_map(attempt_percentage)
                .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))))
        })
        .collect();

    (mean(&best), attempted.len())
}

/// Best score per assignment as a percentage of its max points, averaged
/// over assignments with a non-draft submission.
///
/// Returns (average, assignments with a non-draft submission).
pub fn assignment_average(assignments: &[AssignmentActivity]) -> (Option<f64>, usize) {
    let mut completed = 0;
    let mut best = Vec::new();

    for assignment in assignments {
        let handed_in: Vec<_> = assignment
            .submissions
            .iter()
            .filter(|s| s.status != SubmissionStatus::Draft)
            .collect();
        if handed_in.is_empty() {
            continue;
        }
        completed += 1;

        let top = handed_in
            .iter()
            .filter_map(|s| s.effective_score())
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
        if let Some(pct) = top.and_then(|score| percentage(score, assignment.max_points)) {
            best.push(pct);
        }
    }

    (mean(&best), completed)
}

/// Completed over published lessons, `None` when nothing is published.
pub fn participation(published_lessons: i64, completed_lessons: i64) -> Option<f64> {
    percentage(completed_lessons as f64, published_lessons as f64)
}

/// Weighted mean over the components that have data.
///
/// Weights of missing components are dropped, so the remaining weights are
/// rescaled to sum to one. `None` when no weighted component is present.
pub fn weighted_final(
    quiz: Option<f64>,
    assignment: Option<f64>,
    participation: Option<f64>,
    weights: GradeWeights,
) -> Option<f64> {
    let parts = [
        (quiz, weights.quiz),
        (assignment, weights.assignment),
        (participation, weights.participation),
    ];

    let (sum, used) = parts
        .iter()
        .filter_map(|(value, weight)| value.map(|v| (v, f64::from(*weight))))
        .fold((0.0, 0.0), |(sum, used), (v, w)| (sum + v * w, used + w));

    if used > 0.0 { Some(sum / used) } else { None }
}

/// Pure recalculation of one grade from its inputs.
pub fn compute(activity: &CourseActivity, weights: GradeWeights) -> GradeUpdate {
    let (quiz, completed_quizzes) = quiz_average(&activity.quizzes);
    let (assignment, completed_assignments) = assignment_average(&activity.assignments);
    let lessons = participation(activity.published_lessons, activity.completed_lessons);
    let final_grade = weighted_final(quiz, assignment, lessons, weights);

    let rounded = |v: Option<f64>| v.map(|v| round_to(v, 2));

    GradeUpdate {
        quiz_average: rounded(quiz),
        assignment_average: rounded(assignment),
        participation_score: rounded(lessons),
        final_grade: rounded(final_grade),
        total_quizzes: activity.quizzes.len() as i32,
        completed_quizzes: completed_quizzes as i32,
        total_assignments: activity.assignments.len() as i32,
        completed_assignments: completed_assignments as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::course::SubmissionScore;

    fn weights() -> GradeWeights {
        GradeWeights::default()
    }

    fn quiz(id: i64, questions: i64, scores: &[i32]) -> QuizActivity {
        QuizActivity {
            quiz_id: id,
            question_count: questions,
            submitted_scores: scores
                .iter()
                .map(|&correct_count| AttemptScore {
                    correct_count,
                    total_questions: questions as i32,
                })
                .collect(),
        }
    }

    fn submission(status: SubmissionStatus, final_score: Option<f64>, ai_score: Option<f64>) -> SubmissionScore {
        SubmissionScore {
            status,
            final_score,
            ai_score,
        }
    }

    #[test]
    fn only_assignments_present_renormalizes() {
        assert_eq!(weighted_final(None, Some(80.0), None, weights()), Some(80.0));
    }

    #[test]
    fn all_components_weighted() {
        assert_eq!(
            weighted_final(Some(100.0), Some(80.0), Some(50.0), weights()),
            Some(85.0)
        );
    }

    #[test]
    fn no_components_means_no_grade() {
        assert_eq!(weighted_final(None, None, None, weights()), None);
    }

    #[test]
    fn zero_weight_components_do_not_count() {
        let w = GradeWeights {
            quiz: 0,
            assignment: 0,
            participation: 10,
        };
        assert_eq!(weighted_final(Some(90.0), None, None, w), None);
        assert_eq!(weighted_final(Some(90.0), None, Some(40.0), w), Some(40.0));
    }

    #[test]
    fn weights_need_not_sum_to_one_hundred() {
        let w = GradeWeights {
            quiz: 1,
            assignment: 1,
            participation: 2,
        };
        assert_eq!(weighted_final(Some(100.0), Some(0.0), Some(50.0), w), Some(50.0));
    }

    #[test]
    fn best_attempt_per_quiz_is_used() {
        let (avg, completed) = quiz_average(&[quiz(1, 4, &[0, 4])]);
        assert_eq!(avg, Some(100.0));
        assert_eq!(completed, 1);
    }

    #[test]
    fn unattempted_and_empty_quizzes_are_excluded() {
        let (avg, completed) = quiz_average(&[
            quiz(1, 4, &[2]),
            quiz(2, 10, &[]),
            quiz(3, 0, &[0]),
        ]);
        assert_eq!(avg, Some(50.0));
        assert_eq!(completed, 2);
    }

    #[test]
    fn attempts_keep_the_total_they_were_scored_on() {
        let edited = QuizActivity {
            quiz_id: 1,
            question_count: 1,
            submitted_scores: vec![
                AttemptScore {
                    correct_count: 2,
                    total_questions: 4,
                },
                AttemptScore {
                    correct_count: 1,
                    total_questions: 1,
                },
            ],
        };
        assert_eq!(quiz_average(&[edited]), (Some(100.0), 1));
    }

    #[test]
    fn attempt_percentage_never_exceeds_one_hundred() {
        let stale = AttemptScore {
            correct_count: 2,
            total_questions: 1,
        };
        assert_eq!(attempt_percentage(&stale), Some(100.0));
        let empty = AttemptScore {
            correct_count: 0,
            total_questions: 0,
        };
        assert_eq!(attempt_percentage(&empty), None);
    }

    #[test]
    fn assignment_prefers_final_over_ai_score() {
        let assignments = [AssignmentActivity {
            assignment_id: 1,
            max_points: 50.0,
            submissions: vec![submission(SubmissionStatus::Graded, Some(40.0), Some(10.0))],
        }];
        assert_eq!(assignment_average(&assignments), (Some(80.0), 1));
    }

    #[test]
    fn assignment_takes_best_submission_and_skips_drafts() {
        let assignments = [
            AssignmentActivity {
                assignment_id: 1,
                max_points: 10.0,
                submissions: vec![
                    submission(SubmissionStatus::Graded, None, Some(5.0)),
                    submission(SubmissionStatus::Graded, Some(9.0), None),
                    submission(SubmissionStatus::Draft, Some(10.0), None),
                ],
            },
            AssignmentActivity {
                assignment_id: 2,
                max_points: 10.0,
                submissions: vec![submission(SubmissionStatus::Draft, None, None)],
            },
        ];
        assert_eq!(assignment_average(&assignments), (Some(90.0), 1));
    }

    #[test]
    fn ungraded_submission_counts_as_completed_but_not_scored() {
        let assignments = [AssignmentActivity {
            assignment_id: 1,
            max_points: 10.0,
            submissions: vec![submission(SubmissionStatus::Submitted, None, None)],
        }];
        assert_eq!(assignment_average(&assignments), (None, 1));
    }

    #[test]
    fn participation_without_lessons_is_none() {
        assert_eq!(participation(0, 0), None);
        assert_eq!(participation(4, 1), Some(25.0));
    }

    #[test]
    fn compute_fills_denominators_and_rounds() {
        let activity = CourseActivity {
            quizzes: vec![quiz(1, 3, &[2]), quiz(2, 5, &[])],
            assignments: vec![],
            published_lessons: 3,
            completed_lessons: 1,
        };
        let update = compute(&activity, weights());
        assert_eq!(update.quiz_average, Some(66.67));
        assert_eq!(update.assignment_average, None);
        assert_eq!(update.participation_score, Some(33.33));
        assert_eq!(update.total_quizzes, 2);
        assert_eq!(update.completed_quizzes, 1);
        assert_eq!(update.total_assignments, 0);
        // (66.666.. * 40 + 33.333.. * 10) / 50
        assert_eq!(update.final_grade, Some(60.0));
    }
}
