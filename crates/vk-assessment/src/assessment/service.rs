use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::commission::{self, CommissionMember, CommissionReport};
use super::domain::{CandidateId, QuestionId, SessionId, TestDefinitionId};
use super::question::{QuestionDraft, ValidationError};
use super::repository::{
    CommissionRepository, ConditionRegistry, LevelRegistry, RepositoryError, SessionRepository,
    TestDefinitionRepository, UsageTracker,
};
use super::scoring::ScoreOutcome;
use super::session::{
    AnswerResponse, Clock, KeyedLocks, Session, SessionEngine, SessionError, SessionResultView,
    SessionStatusView,
};
use super::test_definition::{DefinitionSettings, TestDefinition, TestTypeCondition};
use crate::config::AssessmentConfig;

/// Every persistence seam the service needs, in one bound.
pub trait AssessmentStore:
    TestDefinitionRepository
    + SessionRepository
    + LevelRegistry
    + ConditionRegistry
    + UsageTracker
    + CommissionRepository
{
}

impl<T> AssessmentStore for T where
    T: TestDefinitionRepository
        + SessionRepository
        + LevelRegistry
        + ConditionRegistry
        + UsageTracker
        + CommissionRepository
{
}

fn next_definition_id() -> TestDefinitionId {
    TestDefinitionId(format!("def-{}", Uuid::new_v4()))
}

/// Boundary facade: authoring, exam sessions, and commission checks.
///
/// The engines below stay pure; decisions that need collaborators (usage
/// tracking, condition lookup) are made here. Mutations of one definition
/// are serialized by a per-definition lock, backed by the store's version check.
pub struct AssessmentService<R> {
    store: Arc<R>,
    sessions: SessionEngine<R, R>,
    definition_locks: KeyedLocks<TestDefinitionId>,
}

impl<R> AssessmentService<R>
where
    R: AssessmentStore + 'static,
{
    pub fn new(store: Arc<R>, clock: Arc<dyn Clock>, config: &AssessmentConfig) -> Self {
        let sessions = SessionEngine::new(store.clone(), store.clone(), clock, config);
        Self {
            store,
            sessions,
            definition_locks: KeyedLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<R> {
        &self.store
    }

    pub fn start_session(
        &self,
        candidate_id: &CandidateId,
        test_definition_id: &TestDefinitionId,
    ) -> Result<Session, AssessmentServiceError> {
        self.sessions.start(candidate_id, test_definition_id)
    }

    pub fn record_answer(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
        question_id: QuestionId,
        response: AnswerResponse,
    ) -> Result<SessionStatusView, AssessmentServiceError> {
        self.sessions
            .record_answer(candidate_id, session_id, question_id, response)
    }

    pub fn complete_session(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
    ) -> Result<ScoreOutcome, AssessmentServiceError> {
        self.sessions.submit(candidate_id, session_id)
    }

    pub fn session_status(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
    ) -> Result<SessionStatusView, AssessmentServiceError> {
        self.sessions.status(candidate_id, session_id)
    }

    pub fn session_result(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
    ) -> Result<SessionResultView, AssessmentServiceError> {
        self.sessions.result(candidate_id, session_id)
    }

    /// Validate every draft and store a new, unapproved definition.
    pub fn create_definition(
        &self,
        settings: DefinitionSettings,
        drafts: Vec<QuestionDraft>,
    ) -> Result<TestDefinition, AssessmentServiceError> {
        let condition = self.condition(&settings.condition_id)?;
        let questions = drafts
            .iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let definition =
            TestDefinition::build(next_definition_id(), settings, questions, &condition)?;

        let stored = TestDefinitionRepository::insert(self.store.as_ref(), definition)?;
        info!(
            test_definition_id = %stored.id(),
            questions = stored.questions().len(),
            "test definition created"
        );
        Ok(stored)
    }

    pub fn definition(
        &self,
        id: &TestDefinitionId,
    ) -> Result<TestDefinition, AssessmentServiceError> {
        TestDefinitionRepository::fetch(self.store.as_ref(), id)?
            .ok_or_else(|| AssessmentServiceError::DefinitionNotFound(id.clone()))
    }

    /// Upsert one question and persist the re-validated array as a whole.
    pub fn save_question(
        &self,
        id: &TestDefinitionId,
        draft: QuestionDraft,
    ) -> Result<TestDefinition, AssessmentServiceError> {
        let question = draft.validate()?;
        let question_id = question.id().clone();

        self.definition_locks.run(id, || {
            let mut definition = self.unlocked(id)?;
            let condition = self.condition(definition.condition_id())?;
            definition.upsert_question(question, &condition)?;
            let stored = self.write(definition)?;

            info!(
                test_definition_id = %id,
                question_id = %question_id,
                questions = stored.questions().len(),
                "question saved"
            );
            Ok(stored)
        })
    }

    /// Replace the question array as a whole.
    pub fn replace_questions(
        &self,
        id: &TestDefinitionId,
        drafts: Vec<QuestionDraft>,
    ) -> Result<TestDefinition, AssessmentServiceError> {
        let questions = drafts
            .iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;

        self.definition_locks.run(id, || {
            let mut definition = self.unlocked(id)?;
            let condition = self.condition(definition.condition_id())?;
            definition.replace_questions(questions, &condition)?;
            let stored = self.write(definition)?;
            info!(test_definition_id = %id, "questions replaced");
            Ok(stored)
        })
    }

    /// The only way to edit a locked definition: copy it.
    pub fn clone_definition(
        &self,
        id: &TestDefinitionId,
    ) -> Result<TestDefinition, AssessmentServiceError> {
        let source = self.definition(id)?;
        let copy = source.clone_unapproved(next_definition_id());
        let stored = TestDefinitionRepository::insert(self.store.as_ref(), copy)?;
        info!(source = %id, test_definition_id = %stored.id(), "test definition cloned");
        Ok(stored)
    }

    pub fn approve_definition(
        &self,
        id: &TestDefinitionId,
    ) -> Result<TestDefinition, AssessmentServiceError> {
        self.definition_locks.run(id, || {
            let mut definition = self.definition(id)?;
            if definition.is_approved() {
                return Ok(definition);
            }
            definition.approve(self.sessions.now());
            let stored = self.write(definition)?;
            info!(test_definition_id = %id, "test definition approved");
            Ok(stored)
        })
    }

    pub fn commission_validity(&self, members: &[CommissionMember]) -> CommissionReport {
        commission::check(members)
    }

    /// Check the commission stored for a selection procedure.
    pub fn procedure_commission_validity(
        &self,
        procedure_id: &str,
    ) -> Result<CommissionReport, AssessmentServiceError> {
        let members = self
            .store
            .members(procedure_id)?
            .ok_or_else(|| AssessmentServiceError::ProcedureNotFound(procedure_id.to_string()))?;
        let report = commission::check(&members);
        if !report.is_ready {
            warn!(
                procedure_id,
                errors = report.errors.len(),
                warnings = report.warnings.len(),
                "commission is not ready"
            );
        }
        Ok(report)
    }

    fn unlocked(&self, id: &TestDefinitionId) -> Result<TestDefinition, AssessmentServiceError> {
        let definition = self.definition(id)?;
        if definition.is_locked(self.store.in_active_use(id)?) {
            warn!(test_definition_id = %id, "mutation rejected on locked test definition");
            return Err(AssessmentServiceError::DefinitionLocked(id.clone()));
        }
        Ok(definition)
    }

    fn write(&self, definition: TestDefinition) -> Result<TestDefinition, AssessmentServiceError> {
        let expected = definition.version();
        Ok(TestDefinitionRepository::update(
            self.store.as_ref(),
            definition,
            expected,
        )?)
    }

    fn condition(&self, id: &str) -> Result<TestTypeCondition, AssessmentServiceError> {
        self.store
            .condition(id)?
            .ok_or_else(|| AssessmentServiceError::ConditionNotFound(id.to_string()))
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("test definition {0} is approved and used by an active procedure; clone it to edit")]
    DefinitionLocked(TestDefinitionId),
    #[error("test definition {0} not found")]
    DefinitionNotFound(TestDefinitionId),
    #[error("test type condition {0} not found")]
    ConditionNotFound(String),
    #[error("selection procedure {0} not found")]
    ProcedureNotFound(String),
}

impl AssessmentServiceError {
    /// Stable machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AssessmentServiceError::Validation(_) => "VALIDATION_FAILED",
            AssessmentServiceError::Session(error) => match error {
                SessionError::AlreadyActive => "SESSION_ALREADY_ACTIVE",
                SessionError::NotFound(_) => "SESSION_NOT_FOUND",
                SessionError::PreviousLevelNotPassed(_) => "PREVIOUS_LEVEL_NOT_PASSED",
                SessionError::AlreadyCompleted => "SESSION_ALREADY_COMPLETED",
                SessionError::Expired => "SESSION_EXPIRED",
                SessionError::Unauthorized => "SESSION_FORBIDDEN",
                SessionError::NotCompleted => "SESSION_NOT_COMPLETED",
                SessionError::UnknownQuestion(_) => "UNKNOWN_QUESTION",
                SessionError::InvalidResponse { .. } => "INVALID_RESPONSE",
            },
            AssessmentServiceError::Repository(RepositoryError::Conflict) => "CONFLICT",
            AssessmentServiceError::Repository(RepositoryError::ActiveSessionExists) => {
                "SESSION_ALREADY_ACTIVE"
            }
            AssessmentServiceError::Repository(RepositoryError::NotFound) => "NOT_FOUND",
            AssessmentServiceError::Repository(RepositoryError::Unavailable(_)) => {
                "REPOSITORY_UNAVAILABLE"
            }
            AssessmentServiceError::DefinitionLocked(_) => "DEFINITION_LOCKED",
            AssessmentServiceError::DefinitionNotFound(_) => "DEFINITION_NOT_FOUND",
            AssessmentServiceError::ConditionNotFound(_) => "CONDITION_NOT_FOUND",
            AssessmentServiceError::ProcedureNotFound(_) => "PROCEDURE_NOT_FOUND",
        }
    }
}
