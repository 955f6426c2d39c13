use std::collections::BTreeSet;

use crate::assessment::domain::{
    Answer, Letter, QuestionId, QuestionType, FALSE_ANSWER_TEXT, TRUE_ANSWER_TEXT,
};

use super::{Question, QuestionDraft, QuestionKind};

/// Structural problems in a question or test definition. Always recoverable by
/// correcting the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", empty_text_message(*answer))]
    EmptyText { answer: Option<Letter> },
    #[error("{question_type} question needs {min}-{max} answers, found {found}")]
    WrongAnswerCount {
        question_type: QuestionType,
        min: usize,
        max: usize,
        found: usize,
    },
    #[error("{question_type} question has {found} correct answer(s)")]
    WrongCorrectCount {
        question_type: QuestionType,
        found: usize,
    },
    #[error("answer letter {0} appears more than once")]
    DuplicateLetter(Letter),
    #[error("answer {letter} of a true/false question must read '{expected}'")]
    FixedAnswerText {
        letter: Letter,
        expected: &'static str,
    },
    #[error("answer index {index} out of range for {len} answer(s)")]
    AnswerIndexOutOfRange { index: usize, len: usize },
    #[error("question {question_id} uses {question_type}, which this test does not allow")]
    TypeNotAllowed {
        question_id: QuestionId,
        question_type: QuestionType,
    },
    #[error("test must contain {min}-{max} questions, found {found}")]
    QuestionCountOutOfRange { min: usize, max: usize, found: usize },
    #[error("at least one question type must be allowed")]
    NoAllowedTypes,
    #[error("recommended duration must be at least one minute")]
    InvalidDuration,
    #[error("question id {0} is used more than once")]
    DuplicateQuestionId(QuestionId),
}

fn empty_text_message(answer: Option<Letter>) -> String {
    match answer {
        Some(letter) => format!("answer {letter} has no text"),
        None => "question text is required".to_string(),
    }
}

/// Check a draft against the per-type answer table and produce the validated form.
pub fn validate(draft: &QuestionDraft) -> Result<Question, ValidationError> {
    if draft.text.trim().is_empty() {
        return Err(ValidationError::EmptyText { answer: None });
    }

    let mut seen = BTreeSet::new();
    for answer in &draft.answers {
        if !seen.insert(answer.letter) {
            return Err(ValidationError::DuplicateLetter(answer.letter));
        }
    }

    let question_type = draft.question_type;
    let (min, max) = question_type.answer_bounds();
    let found = draft.answers.len();
    if found < min || found > max {
        return Err(ValidationError::WrongAnswerCount {
            question_type,
            min,
            max,
            found,
        });
    }

    let kind = match question_type {
        QuestionType::OpenEnded => QuestionKind::OpenEnded,
        QuestionType::TrueFalse => {
            for (answer, expected) in draft
                .answers
                .iter()
                .zip([TRUE_ANSWER_TEXT, FALSE_ANSWER_TEXT])
            {
                if answer.text.trim() != expected {
                    return Err(ValidationError::FixedAnswerText {
                        letter: answer.letter,
                        expected,
                    });
                }
            }
            let correct = correct_positions(&draft.answers);
            if correct.len() != 1 {
                return Err(ValidationError::WrongCorrectCount {
                    question_type,
                    found: correct.len(),
                });
            }
            QuestionKind::TrueFalse {
                is_true: correct[0] == 0,
            }
        }
        QuestionType::SingleChoice | QuestionType::MultipleChoice => {
            let correct = correct_positions(&draft.answers);
            let count_ok = if question_type == QuestionType::SingleChoice {
                correct.len() == 1
            } else {
                !correct.is_empty()
            };
            if !count_ok {
                return Err(ValidationError::WrongCorrectCount {
                    question_type,
                    found: correct.len(),
                });
            }

            if let Some(blank) = draft
                .answers
                .iter()
                .find(|answer| answer.text.trim().is_empty())
            {
                return Err(ValidationError::EmptyText {
                    answer: Some(blank.letter),
                });
            }

            let options = draft
                .answers
                .iter()
                .map(|answer| answer.text.trim().to_string())
                .collect();
            let letters: BTreeSet<Letter> = correct
                .iter()
                .filter_map(|position| Letter::from_index(*position))
                .collect();

            if question_type == QuestionType::SingleChoice {
                QuestionKind::SingleChoice {
                    options,
                    correct: *letters
                        .first()
                        .ok_or(ValidationError::WrongCorrectCount {
                            question_type,
                            found: 0,
                        })?,
                }
            } else {
                QuestionKind::MultipleChoice {
                    options,
                    correct: letters,
                }
            }
        }
    };

    Ok(Question {
        id: draft.id.clone(),
        order: draft.order,
        text: draft.text.trim().to_string(),
        points: draft.points,
        kind,
    })
}

fn correct_positions(answers: &[Answer]) -> Vec<usize> {
    answers
        .iter()
        .enumerate()
        .filter(|(_, answer)| answer.is_correct)
        .map(|(position, _)| position)
        .collect()
}
