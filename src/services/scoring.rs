// src/services/scoring.rs

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    models::{answer::Answer, quiz::QuizDefinition},
    services::evaluator::evaluate,
    utils::math::round_to,
};

/// Result of one scoring pass over an attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub correct_count: i32,
    pub wrong_count: i32,
    pub total_questions: i32,
    /// Rounded to 2 decimals; 0 for a quiz without questions.
    pub percentage: f64,
    /// (answer id, correct) for every saved answer, to be written onto the answer rows.
    pub marks: Vec<(i64, bool)>,
}

/// Scores `answers` against the quiz they were given for.
///
/// * Answers whose question is no longer in the quiz count as wrong.
/// * Questions with no saved answer count as wrong.
/// * Re-running on the same input yields the same card.
pub fn score(quiz: &QuizDefinition, answers: &[Answer]) -> Scorecard {
    let mut correct_count = 0;
    let mut answered = HashSet::new();
    let mut marks = Vec::with_capacity(answers.len());

    for answer in answers {
        let correct = match quiz.question(answer.question_id) {
            Some(question) => {
                answered.insert(question.id);
                evaluate(question, answer)
            }
            None => {
                tracing::debug!(
                    "Answer {} references question {} no longer in quiz {}",
                    answer.id,
                    answer.question_id,
                    quiz.id
                );
                false
            }
        };
        if correct {
            correct_count += 1;
        }
        marks.push((answer.id, correct));
    }

    let total_questions = quiz.question_count() as i32;
    let unanswered = quiz
        .questions
        .iter()
        .filter(|q| !answered.contains(&q.id))
        .count() as i32;
    let wrong_count = answers.len() as i32 - correct_count + unanswered;

    let percentage = if total_questions == 0 {
        0.0
    } else {
        round_to(f64::from(correct_count) / f64::from(total_questions) * 100.0, 2)
    };

    Scorecard {
        correct_count,
        wrong_count,
        total_questions,
        percentage,
        marks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        question::{Question, QuestionKind, QuestionOption},
        quiz::QuizSettings,
    };

    fn quiz(questions: Vec<Question>) -> QuizDefinition {
        QuizDefinition {
            id: 1,
            course_id: 1,
            title: "Quiz".to_string(),
            is_published: true,
            settings: QuizSettings::default(),
            questions,
        }
    }

    fn single_answer(id: i64, answer: &str) -> Question {
        Question {
            id,
            quiz_id: 1,
            kind: QuestionKind::SingleAnswer,
            content: format!("Question {id}"),
            options: vec![],
            correct_answer: Some(answer.to_string()),
            position: id as i32,
        }
    }

    fn multiple_choice(id: i64, correct: i64) -> Question {
        Question {
            id,
            quiz_id: 1,
            kind: QuestionKind::MultipleChoice,
            content: format!("Question {id}"),
            options: [correct, correct + 1]
                .iter()
                .map(|&option_id| QuestionOption {
                    id: option_id,
                    question_id: id,
                    text: option_id.to_string(),
                    is_correct: option_id == correct,
                })
                .collect(),
            correct_answer: None,
            position: id as i32,
        }
    }

    fn text_answer(id: i64, question_id: i64, text: &str) -> Answer {
        Answer {
            id,
            attempt_id: 1,
            question_id,
            option_id: None,
            user_answer: Some(text.to_string()),
            correct: None,
        }
    }

    #[test]
    fn test_score_half() {
        let quiz = quiz(vec![single_answer(1, "a"), single_answer(2, "b")]);
        let card = score(&quiz, &[text_answer(10, 1, "A"), text_answer(11, 2, "c")]);
        assert_eq!(card.correct_count, 1);
        assert_eq!(card.wrong_count, 1);
        assert_eq!(card.total_questions, 2);
        assert_eq!(card.percentage, 50.0);
        assert_eq!(card.marks, vec![(10, true), (11, false)]);
    }

    #[test]
    fn test_score_rounds_to_two_places() {
        let quiz = quiz(vec![
            single_answer(1, "a"),
            single_answer(2, "b"),
            single_answer(3, "c"),
        ]);
        let card = score(
            &quiz,
            &[
                text_answer(10, 1, "a"),
                text_answer(11, 2, "b"),
                text_answer(12, 3, "x"),
            ],
        );
        assert_eq!(card.percentage, 66.67);
    }

    #[test]
    fn test_score_empty_quiz_is_zero() {
        let card = score(&quiz(vec![]), &[]);
        assert_eq!(card.total_questions, 0);
        assert_eq!(card.percentage, 0.0);
    }

    #[test]
    fn test_unanswered_questions_are_wrong() {
        let quiz = quiz(vec![multiple_choice(1, 100), multiple_choice(2, 200)]);
        let answer = Answer {
            id: 10,
            attempt_id: 1,
            question_id: 1,
            option_id: Some(100),
            user_answer: None,
            correct: None,
        };
        let card = score(&quiz, &[answer]);
        assert_eq!(card.correct_count, 1);
        assert_eq!(card.wrong_count, 1);
        assert_eq!(card.percentage, 50.0);
    }

    #[test]
    fn test_orphaned_answer_counts_as_wrong() {
        let quiz = quiz(vec![single_answer(1, "a")]);
        let card = score(&quiz, &[text_answer(10, 1, "a"), text_answer(11, 99, "a")]);
        assert_eq!(card.correct_count, 1);
        assert_eq!(card.wrong_count, 1);
        assert_eq!(card.percentage, 100.0);
        assert_eq!(card.marks, vec![(10, true), (11, false)]);
    }

    #[test]
    fn test_scoring_is_repeatable() {
        let quiz = quiz(vec![single_answer(1, "a")]);
        let answers = [text_answer(10, 1, "a")];
        assert_eq!(score(&quiz, &answers), score(&quiz, &answers));
    }
}
