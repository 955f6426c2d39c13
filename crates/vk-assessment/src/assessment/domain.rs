use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a single exam question.
    QuestionId
);
string_id!(
    /// Identifier of an authored test definition.
    TestDefinitionId
);
string_id!(
    /// Identifier of one candidate's timed attempt.
    SessionId
);
string_id!(
    /// Authenticated candidate principal supplied by the identity layer.
    CandidateId
);
string_id!(
    /// Commission member's user account.
    UserId
);

pub const MIN_CHOICE_ANSWERS: usize = 2;
pub const MAX_CHOICE_ANSWERS: usize = 6;
pub const TRUE_ANSWER_TEXT: &str = "Pravda";
pub const FALSE_ANSWER_TEXT: &str = "Nepravda";

/// Question variants supported by the authoring tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    OpenEnded,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::SingleChoice,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::OpenEnded,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "SINGLE_CHOICE",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::TrueFalse => "TRUE_FALSE",
            QuestionType::OpenEnded => "OPEN_ENDED",
        }
    }

    /// Inclusive `(min, max)` number of structured answers.
    pub const fn answer_bounds(self) -> (usize, usize) {
        match self {
            QuestionType::SingleChoice | QuestionType::MultipleChoice => {
                (MIN_CHOICE_ANSWERS, MAX_CHOICE_ANSWERS)
            }
            QuestionType::TrueFalse => (2, 2),
            QuestionType::OpenEnded => (0, 0),
        }
    }

    /// Marking an answer correct clears every other answer.
    pub const fn has_exclusive_correct(self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::TrueFalse)
    }

    /// Whether the scoring engine can grade the question without a reviewer.
    pub const fn is_auto_scored(self) -> bool {
        !matches!(self, QuestionType::OpenEnded)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Positional answer label: A, B, C...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Letter(char);

impl Letter {
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .filter(|offset| *offset < 26)
            .map(|offset| Self(char::from(b'A' + offset)))
    }

    pub fn index(self) -> Option<usize> {
        if self.0.is_ascii_uppercase() {
            Some(usize::from(self.0 as u8 - b'A'))
        } else {
            None
        }
    }

    pub const fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loose answer record as authored and exchanged over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub letter: Letter,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl Answer {
    pub fn new(index: usize, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            letter: letter_for(index),
            text: text.into(),
            is_correct,
        }
    }
}

pub(crate) fn letter_for(index: usize) -> Letter {
    // Answer counts are bounded far below 26; clamp rather than panic.
    Letter::from_index(index.min(25)).unwrap_or(Letter('Z'))
}

/// Rewrite letters so they follow array order.
pub fn reletter(answers: &mut [Answer]) {
    for (index, answer) in answers.iter_mut().enumerate() {
        answer.letter = letter_for(index);
    }
}
