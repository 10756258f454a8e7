// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use assessment_engine::{
    events::EventBus,
    models::{
        question::{Question, QuestionKind, QuestionOption},
        quiz::{QuizDefinition, QuizSettings},
    },
    services::{AttemptManager, GradeAggregator, attempts::Clock},
    store::MemoryStore,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const COURSE_ID: i64 = 10;
pub const QUIZ_ID: i64 = 1;
pub const Q1: i64 = 101;
pub const Q2: i64 = 102;
pub const OPT_A: i64 = 1011;
pub const OPT_B: i64 = 1012;
pub const OPT_C: i64 = 1021;
pub const OPT_D: i64 = 1022;
pub const OPT_E: i64 = 1023;

pub fn option(id: i64, question_id: i64, is_correct: bool) -> QuestionOption {
    QuestionOption {
        id,
        question_id,
        text: format!("Option {id}"),
        is_correct,
    }
}

pub fn multiple_choice(id: i64, quiz_id: i64, options: Vec<QuestionOption>) -> Question {
    Question {
        id,
        quiz_id,
        kind: QuestionKind::MultipleChoice,
        content: format!("Multiple choice {id}"),
        options,
        correct_answer: None,
        position: 0,
    }
}

pub fn checkbox(id: i64, quiz_id: i64, options: Vec<QuestionOption>) -> Question {
    Question {
        id,
        quiz_id,
        kind: QuestionKind::Checkbox,
        content: format!("Checkbox {id}"),
        options,
        correct_answer: None,
        position: 1,
    }
}

pub fn single_answer(id: i64, quiz_id: i64, answer: &str) -> Question {
    Question {
        id,
        quiz_id,
        kind: QuestionKind::SingleAnswer,
        content: format!("Single answer {id}"),
        options: vec![],
        correct_answer: Some(answer.to_string()),
        position: 2,
    }
}

/// Q1: multiple choice, A correct. Q2: checkbox, {C, D} correct.
pub fn two_question_quiz(settings: QuizSettings) -> QuizDefinition {
    QuizDefinition {
        id: QUIZ_ID,
        course_id: COURSE_ID,
        title: "Scenario".to_string(),
        is_published: true,
        settings,
        questions: vec![
            multiple_choice(Q1, QUIZ_ID, vec![option(OPT_A, Q1, true), option(OPT_B, Q1, false)]),
            checkbox(
                Q2,
                QUIZ_ID,
                vec![
                    option(OPT_C, Q2, true),
                    option(OPT_D, Q2, true),
                    option(OPT_E, Q2, false),
                ],
            ),
        ],
    }
}

/// A published quiz of `questions` single-answer questions whose answer is "yes".
pub fn yes_quiz(quiz_id: i64, course_id: i64, questions: i64) -> QuizDefinition {
    QuizDefinition {
        id: quiz_id,
        course_id,
        title: format!("Quiz {quiz_id}"),
        is_published: true,
        settings: QuizSettings::default(),
        questions: (0..questions)
            .map(|i| single_answer(quiz_id * 1000 + i, quiz_id, "yes"))
            .collect(),
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

/// A clock that only moves when the returned offset (seconds) is changed.
pub fn manual_clock() -> (Clock, Arc<AtomicI64>) {
    let offset = Arc::new(AtomicI64::new(0));
    let handle = offset.clone();
    let clock: Clock =
        Arc::new(move || start_time() + Duration::seconds(handle.load(Ordering::SeqCst)));
    (clock, offset)
}

pub async fn store_with(quizzes: Vec<QuizDefinition>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for quiz in quizzes {
        store.add_quiz(quiz).await.expect("valid quiz");
    }
    store
}

pub fn manager(store: &Arc<MemoryStore>) -> AttemptManager {
    AttemptManager::new(store.clone(), EventBus::default())
}

pub fn aggregator(store: &Arc<MemoryStore>) -> GradeAggregator {
    GradeAggregator::new(store.clone(), Default::default())
}
