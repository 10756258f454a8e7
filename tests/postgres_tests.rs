// tests/postgres_tests.rs
//
// Runs against a live Postgres when DATABASE_URL is set; otherwise each test
// returns early.

mod common;

use std::sync::Arc;

use assessment_engine::{
    AssessmentError,
    events::EventBus,
    models::{answer::AnswerInput, quiz::QuizSettings},
    services::{AttemptManager, GradeAggregator},
    store::{AttemptStore, PgStore},
};
use common::*;
use sqlx::postgres::PgPoolOptions;

/// Connects and migrates, or `None` when no database is configured.
async fn setup() -> Option<Arc<PgStore>> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(Arc::new(PgStore::new(pool)))
}

/// Ids that do not collide with rows left behind by earlier runs.
fn unique_id() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

#[tokio::test]
async fn scenario_round_trips_through_postgres() {
    let Some(store) = setup().await else { return };
    let mut definition = two_question_quiz(QuizSettings::default());
    definition.course_id = unique_id();
    let quiz = store.insert_quiz(&definition).await.unwrap();

    let reloaded = store.quiz(quiz.id).await.unwrap().unwrap();
    assert_eq!(reloaded, quiz);

    let q1 = &quiz.questions[0];
    let q2 = &quiz.questions[1];
    let correct_single = q1.options.iter().find(|o| o.is_correct).unwrap().id;
    let wrong_pick = [q2.options[0].id, q2.options[2].id];

    let user = unique_id();
    let manager = AttemptManager::new(store.clone(), EventBus::default());
    let attempt = manager.start(user, quiz.id).await.unwrap();
    assert_eq!(attempt.attempt_number, 1);

    manager
        .record_answer(user, attempt.id, q1.id, AnswerInput::option(correct_single))
        .await
        .unwrap();
    manager
        .record_answer(user, attempt.id, q2.id, AnswerInput::selection(&wrong_pick))
        .await
        .unwrap();

    let receipt = manager.submit(user, attempt.id).await.unwrap();
    assert_eq!(receipt.scorecard.correct_count, 1);
    assert_eq!(receipt.scorecard.wrong_count, 1);
    assert_eq!(receipt.scorecard.percentage, 50.0);

    let stored = store.attempt(attempt.id).await.unwrap().unwrap();
    assert_eq!(stored.attempt.correct_count, Some(1));
    assert_eq!(stored.attempt.total_questions, Some(2));
    assert!(stored.answers.iter().all(|a| a.correct.is_some()));

    let err = manager.submit(user, attempt.id).await.unwrap_err();
    assert!(matches!(err, AssessmentError::AlreadySubmitted(_)));
    let unchanged = store.attempt(attempt.id).await.unwrap().unwrap();
    assert_eq!(unchanged.attempt, stored.attempt);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_respect_the_limit() {
    let Some(store) = setup().await else { return };
    let mut definition = yes_quiz(1, unique_id(), 1);
    definition.settings.attempts_allowed = Some(1);
    let quiz = store.insert_quiz(&definition).await.unwrap();

    let user = unique_id();
    let manager = Arc::new(AttemptManager::new(store.clone(), EventBus::default()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let attempt = manager.get_or_start(user, quiz.id).await?;
            manager.submit(user, attempt.id).await
        }));
    }

    let mut submitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => submitted += 1,
            Err(AssessmentError::AlreadySubmitted(_))
            | Err(AssessmentError::AttemptLimitExceeded { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(submitted, 1);
    assert_eq!(store.count_submitted(user, quiz.id).await.unwrap(), 1);

    let err = manager.start(user, quiz.id).await.unwrap_err();
    assert!(matches!(err, AssessmentError::AttemptLimitExceeded { allowed: 1, .. }));
}

#[tokio::test]
async fn grade_reflects_quizzes_assignments_and_lessons() {
    let Some(store) = setup().await else { return };
    let course_id = unique_id();
    let quiz = store.insert_quiz(&yes_quiz(1, course_id, 2)).await.unwrap();

    let user = unique_id();
    let manager = AttemptManager::new(store.clone(), EventBus::default());
    let attempt = manager.start(user, quiz.id).await.unwrap();
    manager
        .record_answer(user, attempt.id, quiz.questions[0].id, AnswerInput::text(" YES "))
        .await
        .unwrap();
    manager.submit(user, attempt.id).await.unwrap();

    let pool = store.pool();
    let (assignment_id,): (i64,) = sqlx::query_as(
        "INSERT INTO assignments (course_id, max_points, is_published) VALUES ($1, 20, TRUE) RETURNING id",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO assignment_submissions (assignment_id, user_id, status, final_score) VALUES ($1, $2, 'graded', 15)",
    )
    .bind(assignment_id)
    .bind(user)
    .execute(pool)
    .await
    .unwrap();

    let (lesson_id,): (i64,) =
        sqlx::query_as("INSERT INTO lessons (course_id, is_published) VALUES ($1, TRUE) RETURNING id")
            .bind(course_id)
            .fetch_one(pool)
            .await
            .unwrap();
    sqlx::query("INSERT INTO lessons (course_id, is_published) VALUES ($1, TRUE)")
        .bind(course_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO lesson_completions (user_id, lesson_id) VALUES ($1, $2)")
        .bind(user)
        .bind(lesson_id)
        .execute(pool)
        .await
        .unwrap();

    let aggregator = GradeAggregator::new(store.clone(), Default::default());
    let grade = aggregator.recalculate(user, course_id).await.unwrap();
    assert_eq!(grade.quiz_average, Some(50.0));
    assert_eq!(grade.assignment_average, Some(75.0));
    assert_eq!(grade.participation_score, Some(50.0));
    // (50 * 40 + 75 * 50 + 50 * 10) / 100
    assert_eq!(grade.final_grade, Some(62.5));
    assert_eq!((grade.total_quizzes, grade.completed_quizzes), (1, 1));

    let again = aggregator.recalculate(user, course_id).await.unwrap();
    assert_eq!(again.id, grade.id);
    assert_eq!(again.final_grade, grade.final_grade);

    let summary = aggregator.recalculate_all(Some(course_id)).await.unwrap();
    assert_eq!(summary.recalculated, 1);
    assert_eq!(summary.failed, 0);

    let everything = aggregator.recalculate_all(None).await.unwrap();
    assert!(everything.recalculated >= 1);
    assert_eq!(everything.failed, 0);
}
