//! Exam authoring, timed candidate sessions, scoring, and commission checks.
//!
//! The engines (`question`, `test_definition`, `scoring`, `commission`) are
//! pure. The session engine reads the server clock through [`Clock`] and
//! writes through [`SessionRepository`]; the service decides everything that
//! needs a collaborator.

pub mod commission;
pub mod domain;
pub mod memory;
pub mod question;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;
pub mod test_definition;

#[cfg(test)]
mod tests;

pub use commission::{
    check as check_commission, CommissionIssue, CommissionMember, CommissionReport,
};
pub use domain::{
    Answer, CandidateId, Letter, QuestionId, QuestionType, SessionId, TestDefinitionId, UserId,
};
pub use memory::InMemoryStore;
pub use question::{retype_answers, Question, QuestionDraft, QuestionKind, ValidationError};
pub use repository::{
    CommissionRepository, ConditionRegistry, LevelRegistry, RepositoryError, SessionRepository,
    TestDefinitionRepository, UsageTracker,
};
pub use router::{assessment_router, CANDIDATE_HEADER};
pub use scoring::{
    GradeVerdict, MultipleChoicePolicy, QuestionGrade, ScoreOutcome, ScoringConfig, ScoringEngine,
};
pub use service::{AssessmentService, AssessmentServiceError, AssessmentStore};
pub use session::{
    AnswerResponse, Clock, CompletionReason, ManualClock, Session, SessionError,
    SessionResultView, SessionStatus, SessionStatusView, SystemClock,
};
pub use test_definition::{DefinitionSettings, TestDefinition, TestTypeCondition};
