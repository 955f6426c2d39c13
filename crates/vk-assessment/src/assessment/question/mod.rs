//! Exam questions: the editable draft shape and the validated tagged union.

mod editing;
mod validator;

pub use editing::retype_answers;
pub use validator::{validate, ValidationError};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{
    letter_for, Answer, Letter, QuestionId, QuestionType, FALSE_ANSWER_TEXT, TRUE_ANSWER_TEXT,
};

/// Question as authored: loosely shaped, may be temporarily invalid while edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    #[serde(default)]
    pub order: u32,
    pub text: String,
    pub points: u32,
    pub question_type: QuestionType,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl QuestionDraft {
    /// Fresh draft with the minimal answer shape for `question_type`.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        points: u32,
        question_type: QuestionType,
    ) -> Self {
        Self {
            id,
            order: 0,
            text: text.into(),
            points,
            question_type,
            answers: retype_answers(QuestionType::OpenEnded, &[], question_type),
        }
    }

    pub fn validate(&self) -> Result<Question, ValidationError> {
        validate(self)
    }
}

/// Answer structure per question type. Each variant can only express a valid shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    SingleChoice {
        options: Vec<String>,
        correct: Letter,
    },
    MultipleChoice {
        options: Vec<String>,
        correct: BTreeSet<Letter>,
    },
    /// `is_true` marks "Pravda" (A) as the correct answer, otherwise "Nepravda" (B).
    TrueFalse { is_true: bool },
    OpenEnded,
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::SingleChoice { .. } => QuestionType::SingleChoice,
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionKind::OpenEnded => QuestionType::OpenEnded,
        }
    }
}

/// A question that passed validation. Only obtainable through [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    order: u32,
    text: String,
    points: u32,
    kind: QuestionKind,
}

impl Question {
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub(crate) fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    /// Letters of every correct answer; empty for open-ended questions.
    pub fn correct_letters(&self) -> BTreeSet<Letter> {
        match &self.kind {
            QuestionKind::SingleChoice { correct, .. } => BTreeSet::from([*correct]),
            QuestionKind::MultipleChoice { correct, .. } => correct.clone(),
            QuestionKind::TrueFalse { is_true } => {
                BTreeSet::from([letter_for(if *is_true { 0 } else { 1 })])
            }
            QuestionKind::OpenEnded => BTreeSet::new(),
        }
    }

    pub fn answer_count(&self) -> usize {
        match &self.kind {
            QuestionKind::SingleChoice { options, .. }
            | QuestionKind::MultipleChoice { options, .. } => options.len(),
            QuestionKind::TrueFalse { .. } => 2,
            QuestionKind::OpenEnded => 0,
        }
    }

    /// Expand back into lettered answer records.
    pub fn answers(&self) -> Vec<Answer> {
        let correct = self.correct_letters();
        let texts: Vec<&str> = match &self.kind {
            QuestionKind::SingleChoice { options, .. }
            | QuestionKind::MultipleChoice { options, .. } => {
                options.iter().map(String::as_str).collect()
            }
            QuestionKind::TrueFalse { .. } => vec![TRUE_ANSWER_TEXT, FALSE_ANSWER_TEXT],
            QuestionKind::OpenEnded => Vec::new(),
        };

        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                let letter = letter_for(index);
                Answer {
                    letter,
                    text: text.to_string(),
                    is_correct: correct.contains(&letter),
                }
            })
            .collect()
    }

    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            id: self.id.clone(),
            order: self.order,
            text: self.text.clone(),
            points: self.points,
            question_type: self.question_type(),
            answers: self.answers(),
        }
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = ValidationError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        validate(&draft)
    }
}

impl From<Question> for QuestionDraft {
    fn from(question: Question) -> Self {
        question.to_draft()
    }
}
