mod config;
mod policy;
mod rules;

pub use config::ScoringConfig;
pub use policy::MultipleChoicePolicy;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{QuestionId, QuestionType};
use super::session::{AnswerResponse, Session};
use super::test_definition::TestDefinition;
use rules::grade_question;

/// Stateless grader: a pure function of the recorded answers and the questions.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(
        &self,
        answers: &BTreeMap<QuestionId, AnswerResponse>,
        definition: &TestDefinition,
    ) -> ScoreOutcome {
        let grades: Vec<QuestionGrade> = definition
            .questions()
            .iter()
            .map(|question| grade_question(question, answers.get(question.id()), &self.config))
            .collect();

        let score: f64 = grades.iter().map(|grade| grade.awarded).sum();
        let max_score: f64 = grades.iter().map(|grade| grade.possible).sum();
        let pending_review = grades
            .iter()
            .filter(|grade| grade.verdict == GradeVerdict::PendingReview)
            .count();
        let correct_count = grades
            .iter()
            .filter(|grade| grade.verdict == GradeVerdict::Correct)
            .count();
        let total_questions = grades.len();

        ScoreOutcome {
            score,
            max_score,
            passed: score >= definition.recommended_score(),
            pending_review,
            correct_count,
            total_questions,
            success_rate: success_rate(correct_count, total_questions),
            grades,
        }
    }

    pub fn score_session(&self, session: &Session, definition: &TestDefinition) -> ScoreOutcome {
        self.score(&session.answers, definition)
    }
}

/// Percentage of questions answered fully correctly; 0 for an empty test.
fn success_rate(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

/// How a single question was graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeVerdict {
    Correct,
    Partial,
    Incorrect,
    Unanswered,
    /// Open-ended; waits for a human grade and is excluded from `max_score`.
    PendingReview,
}

/// Per-question contribution, kept for result breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionGrade {
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub awarded: f64,
    pub possible: f64,
    pub verdict: GradeVerdict,
}

/// Result frozen onto a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub score: f64,
    pub max_score: f64,
    pub passed: bool,
    pub pending_review: usize,
    /// Questions graded `Correct`; partial credit does not count.
    pub correct_count: usize,
    pub total_questions: usize,
    /// `correct_count / total_questions` as a percentage.
    pub success_rate: f64,
    pub grades: Vec<QuestionGrade>,
}

impl ScoreOutcome {
    pub fn summary(&self) -> String {
        let verdict = if self.passed { "passed" } else { "failed" };
        if self.pending_review == 0 {
            format!("{verdict} with {} of {} points", self.score, self.max_score)
        } else {
            format!(
                "{verdict} with {} of {} points ({} question(s) awaiting review)",
                self.score, self.max_score, self.pending_review
            )
        }
    }
}
