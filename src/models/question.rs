// src/models/question.rs

use std::{borrow::Cow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// The closed set of question variants the evaluator understands.
///
/// Stored as snake_case text (`multiple_choice`, `checkbox`, `single_answer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one option is correct; the answer carries an `option_id`.
    MultipleChoice,
    /// One or more options are correct; the answer carries a serialized id list.
    Checkbox,
    /// Free text compared against `correct_answer`.
    SingleAnswer,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Checkbox => "checkbox",
            QuestionKind::SingleAnswer => "single_answer",
        }
    }

    /// Whether this variant is answered by picking options.
    pub fn has_options(&self) -> bool {
        !matches!(self, QuestionKind::SingleAnswer)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQuestionKind(pub String);

impl fmt::Display for UnknownQuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown question kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownQuestionKind {}

impl FromStr for QuestionKind {
    type Err = UnknownQuestionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionKind::MultipleChoice),
            "checkbox" => Ok(QuestionKind::Checkbox),
            "single_answer" => Ok(QuestionKind::SingleAnswer),
            other => Err(UnknownQuestionKind(other.to_string())),
        }
    }
}

/// A selectable option of a MultipleChoice or Checkbox question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Represents the 'questions' table joined with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// Question variant. Mapped from the database column 'type'.
    #[serde(rename = "type")]
    pub kind: QuestionKind,

    /// The text content of the question.
    pub content: String,

    /// Ordered options. Empty for SingleAnswer.
    #[serde(default)]
    pub options: Vec<QuestionOption>,

    /// Expected text. Only meaningful for SingleAnswer.
    pub correct_answer: Option<String>,

    /// Display order within the quiz.
    pub position: i32,
}

impl Question {
    pub fn has_option(&self, option_id: i64) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    pub fn correct_option_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.options.iter().filter(|o| o.is_correct).map(|o| o.id)
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Authoring-time checks. The evaluator does not rely on these holding.
impl Validate for Question {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.content.trim().is_empty() {
            errors.add(
                "content",
                invalid("content_empty", format!("question {} has no content", self.id)),
            );
        }

        if let Some(stray) = self.options.iter().find(|o| o.question_id != self.id) {
            errors.add(
                "options",
                invalid(
                    "option_not_owned",
                    format!("option {} belongs to question {}", stray.id, stray.question_id),
                ),
            );
        }

        let correct = self.correct_option_ids().count();
        match self.kind {
            QuestionKind::MultipleChoice if correct != 1 => {
                errors.add(
                    "options",
                    invalid(
                        "exactly_one_correct_option",
                        format!("multiple choice question {} has {} correct options", self.id, correct),
                    ),
                );
            }
            QuestionKind::Checkbox if correct == 0 => {
                errors.add(
                    "options",
                    invalid(
                        "at_least_one_correct_option",
                        format!("checkbox question {} has no correct option", self.id),
                    ),
                );
            }
            QuestionKind::SingleAnswer => {
                let blank = self
                    .correct_answer
                    .as_deref()
                    .is_none_or(|a| a.trim().is_empty());
                if blank {
                    errors.add(
                        "correct_answer",
                        invalid(
                            "correct_answer_empty",
                            format!("single answer question {} has no correct answer", self.id),
                        ),
                    );
                }
                if !self.options.is_empty() {
                    errors.add(
                        "options",
                        invalid(
                            "options_not_allowed",
                            format!("single answer question {} must not have options", self.id),
                        ),
                    );
                }
            }
            _ => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
