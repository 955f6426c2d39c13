use crate::assessment::domain::{
    letter_for, reletter, Answer, Letter, QuestionType, FALSE_ANSWER_TEXT, MIN_CHOICE_ANSWERS,
    TRUE_ANSWER_TEXT,
};

use super::{QuestionDraft, ValidationError};

impl QuestionDraft {
    /// Append an answer lettered after the last one.
    pub fn add_answer(&mut self, text: impl Into<String>) -> Result<Letter, ValidationError> {
        let (min, max) = self.question_type.answer_bounds();
        let found = self.answers.len();
        if found >= max {
            return Err(ValidationError::WrongAnswerCount {
                question_type: self.question_type,
                min,
                max,
                found: found + 1,
            });
        }

        let letter = letter_for(found);
        self.answers.push(Answer {
            letter,
            text: text.into(),
            is_correct: false,
        });
        Ok(letter)
    }

    /// Remove the answer at `index` and re-letter the rest.
    pub fn remove_answer(&mut self, index: usize) -> Result<Answer, ValidationError> {
        let (min, max) = self.question_type.answer_bounds();
        let found = self.answers.len();
        if index >= found {
            return Err(ValidationError::AnswerIndexOutOfRange { index, len: found });
        }
        if found <= min {
            return Err(ValidationError::WrongAnswerCount {
                question_type: self.question_type,
                min,
                max,
                found: found - 1,
            });
        }

        let mut answers = self.answers.clone();
        let removed = answers.remove(index);
        reletter(&mut answers);
        self.answers = answers;
        Ok(removed)
    }

    /// Set correctness of one answer. Single-choice and true/false questions
    /// clear every other answer in the same write.
    pub fn set_correct(&mut self, index: usize, is_correct: bool) -> Result<(), ValidationError> {
        let len = self.answers.len();
        if index >= len {
            return Err(ValidationError::AnswerIndexOutOfRange { index, len });
        }

        let exclusive = is_correct && self.question_type.has_exclusive_correct();
        for (position, answer) in self.answers.iter_mut().enumerate() {
            if position == index {
                answer.is_correct = is_correct;
            } else if exclusive {
                answer.is_correct = false;
            }
        }
        Ok(())
    }

    /// Edit an answer's text. True/false answers keep their fixed wording.
    pub fn set_answer_text(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let len = self.answers.len();
        let answer = self
            .answers
            .get_mut(index)
            .ok_or(ValidationError::AnswerIndexOutOfRange { index, len })?;

        if self.question_type == QuestionType::TrueFalse {
            let expected = if index == 0 {
                TRUE_ANSWER_TEXT
            } else {
                FALSE_ANSWER_TEXT
            };
            return Err(ValidationError::FixedAnswerText {
                letter: answer.letter,
                expected,
            });
        }

        answer.text = text.into();
        Ok(())
    }

    /// Switch the question type, reshaping answers accordingly.
    pub fn retype(&mut self, new_type: QuestionType) {
        self.answers = retype_answers(self.question_type, &self.answers, new_type);
        self.question_type = new_type;
    }
}

/// Answers a question holds after moving from `old_type` to `new_type`.
///
/// Moving to true/false is lossy: the set is replaced by the two fixed
/// answers, keeping the old correctness of positions 0/1 when exactly one of
/// them was correct and defaulting to "Pravda" otherwise. Moving to
/// open-ended drops all answers. Choice types keep their answers and are
/// padded with blank placeholders up to two, the first placeholder of an
/// empty set marked correct.
pub fn retype_answers(
    old_type: QuestionType,
    old_answers: &[Answer],
    new_type: QuestionType,
) -> Vec<Answer> {
    match new_type {
        QuestionType::TrueFalse => {
            let first = old_answers.first().map(|a| a.is_correct).unwrap_or(false);
            let second = old_answers.get(1).map(|a| a.is_correct).unwrap_or(false);
            let pravda_correct = !(second && !first);
            vec![
                Answer::new(0, TRUE_ANSWER_TEXT, pravda_correct),
                Answer::new(1, FALSE_ANSWER_TEXT, !pravda_correct),
            ]
        }
        QuestionType::OpenEnded => Vec::new(),
        QuestionType::SingleChoice | QuestionType::MultipleChoice => {
            let mut answers = if old_type == QuestionType::OpenEnded {
                Vec::new()
            } else {
                old_answers.to_vec()
            };
            while answers.len() < MIN_CHOICE_ANSWERS {
                let is_correct = answers.is_empty();
                answers.push(Answer::new(answers.len(), "", is_correct));
            }
            reletter(&mut answers);
            answers
        }
    }
}
