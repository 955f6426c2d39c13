use std::collections::BTreeSet;

use crate::assessment::question::{Question, QuestionKind};
use crate::assessment::session::AnswerResponse;

use super::config::ScoringConfig;
use super::{GradeVerdict, QuestionGrade};

pub(crate) fn grade_question(
    question: &Question,
    response: Option<&AnswerResponse>,
    config: &ScoringConfig,
) -> QuestionGrade {
    let possible = if question.question_type().is_auto_scored() {
        f64::from(question.points())
    } else {
        0.0
    };
    let grade = |awarded: f64, verdict: GradeVerdict| QuestionGrade {
        question_id: question.id().clone(),
        question_type: question.question_type(),
        awarded,
        possible,
        verdict,
    };

    if let QuestionKind::OpenEnded = question.kind() {
        return grade(0.0, GradeVerdict::PendingReview);
    }

    let response = match response {
        Some(response) if !response.is_blank() => response,
        _ => return grade(0.0, GradeVerdict::Unanswered),
    };

    let correct = question.correct_letters();
    match question.kind() {
        QuestionKind::SingleChoice { .. } | QuestionKind::TrueFalse { .. } => match response {
            AnswerResponse::Choice(letter) if correct.contains(letter) => {
                grade(possible, GradeVerdict::Correct)
            }
            _ => grade(0.0, GradeVerdict::Incorrect),
        },
        QuestionKind::MultipleChoice { .. } => {
            let selected: BTreeSet<_> = match response {
                AnswerResponse::Choices(letters) => letters.clone(),
                AnswerResponse::Choice(letter) => BTreeSet::from([*letter]),
                AnswerResponse::Text(_) => return grade(0.0, GradeVerdict::Incorrect),
            };
            let hits = selected.intersection(&correct).count();
            let misses = selected.difference(&correct).count();
            let awarded = config
                .multiple_choice
                .award(question.points(), hits, misses, correct.len());

            let verdict = if hits == correct.len() && misses == 0 {
                GradeVerdict::Correct
            } else if awarded > 0.0 {
                GradeVerdict::Partial
            } else {
                GradeVerdict::Incorrect
            };
            grade(awarded, verdict)
        }
        QuestionKind::OpenEnded => grade(0.0, GradeVerdict::PendingReview),
    }
}
