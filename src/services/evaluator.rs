// src/services/evaluator.rs

use std::collections::BTreeSet;

use crate::{
    models::{
        answer::Answer,
        question::{Question, QuestionKind},
    },
    utils::selection::parse_selection_lenient,
};

/// Decides whether `answer` is a correct response to `question`.
///
/// Pure and total. Never touches `answer.correct`.
pub fn evaluate(question: &Question, answer: &Answer) -> bool {
    match question.kind {
        QuestionKind::MultipleChoice => evaluate_multiple_choice(question, answer.option_id),
        QuestionKind::Checkbox => evaluate_checkbox(question, answer.user_answer.as_deref()),
        QuestionKind::SingleAnswer => {
            evaluate_single_answer(question, answer.user_answer.as_deref())
        }
    }
}

fn evaluate_multiple_choice(question: &Question, selected: Option<i64>) -> bool {
    let mut correct = question.correct_option_ids();
    match (correct.next(), correct.next(), selected) {
        (Some(only), None, Some(selected)) => only == selected,
        // No correct option, several correct options, or nothing picked.
        _ => false,
    }
}

fn evaluate_checkbox(question: &Question, raw: Option<&str>) -> bool {
    let expected: BTreeSet<i64> = question.correct_option_ids().collect();
    if expected.is_empty() {
        return false;
    }
    parse_selection_lenient(raw) == expected
}

fn evaluate_single_answer(question: &Question, text: Option<&str>) -> bool {
    let expected = normalize(question.correct_answer.as_deref().unwrap_or_default());
    if expected.is_empty() {
        return false;
    }
    normalize(text.unwrap_or_default()) == expected
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionOption;

    fn question(kind: QuestionKind, correct: &[i64], answer: Option<&str>) -> Question {
        Question {
            id: 1,
            quiz_id: 1,
            kind,
            content: "?".to_string(),
            options: (1..=4)
                .map(|id| QuestionOption {
                    id,
                    question_id: 1,
                    text: format!("Option {id}"),
                    is_correct: correct.contains(&id),
                })
                .collect(),
            correct_answer: answer.map(str::to_string),
            position: 0,
        }
    }

    fn answer(option_id: Option<i64>, text: Option<&str>) -> Answer {
        Answer {
            id: 1,
            attempt_id: 1,
            question_id: 1,
            option_id,
            user_answer: text.map(str::to_string),
            correct: None,
        }
    }

    #[test]
    fn multiple_choice_matches_the_correct_option() {
        let q = question(QuestionKind::MultipleChoice, &[2], None);
        assert!(evaluate(&q, &answer(Some(2), None)));
        assert!(!evaluate(&q, &answer(Some(3), None)));
        assert!(!evaluate(&q, &answer(None, None)));
    }

    #[test]
    fn multiple_choice_with_ambiguous_key_fails_closed() {
        let q = question(QuestionKind::MultipleChoice, &[1, 2], None);
        assert!(!evaluate(&q, &answer(Some(1), None)));
        let q = question(QuestionKind::MultipleChoice, &[], None);
        assert!(!evaluate(&q, &answer(Some(1), None)));
    }

    #[test]
    fn checkbox_requires_exact_set() {
        let q = question(QuestionKind::Checkbox, &[1, 2, 3], None);
        assert!(!evaluate(&q, &answer(None, Some("[1,2]"))));
        assert!(evaluate(&q, &answer(None, Some("[1,2,3]"))));
        assert!(evaluate(&q, &answer(None, Some("[3,1,2]"))));
        assert!(!evaluate(&q, &answer(None, Some("[1,2,3,4]"))));
    }

    #[test]
    fn checkbox_malformed_selection_is_empty() {
        let q = question(QuestionKind::Checkbox, &[1], None);
        assert!(!evaluate(&q, &answer(None, Some("not json"))));
        assert!(!evaluate(&q, &answer(None, None)));
    }

    #[test]
    fn single_answer_ignores_case_and_surrounding_space() {
        let q = question(QuestionKind::SingleAnswer, &[], Some("Paris"));
        assert!(evaluate(&q, &answer(None, Some("PARIS"))));
        assert!(evaluate(&q, &answer(None, Some("  paris "))));
        assert!(!evaluate(&q, &answer(None, Some("Lyon"))));
        assert!(!evaluate(&q, &answer(None, None)));
    }

    #[test]
    fn single_answer_with_blank_key_never_matches() {
        let q = question(QuestionKind::SingleAnswer, &[], Some(""));
        assert!(!evaluate(&q, &answer(None, Some("paris "))));
        assert!(!evaluate(&q, &answer(None, Some(""))));
        let q = question(QuestionKind::SingleAnswer, &[], None);
        assert!(!evaluate(&q, &answer(None, Some(""))));
    }
}
