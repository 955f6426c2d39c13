use super::commission::CommissionMember;
use super::domain::{CandidateId, SessionId, TestDefinitionId};
use super::session::Session;
use super::test_definition::{TestDefinition, TestTypeCondition};

/// Storage abstraction for test definitions.
pub trait TestDefinitionRepository: Send + Sync {
    fn insert(&self, definition: TestDefinition) -> Result<TestDefinition, RepositoryError>;
    /// Replace the stored definition as a whole. Optimistic like
    /// [`SessionRepository::update`]: fails with `Conflict` unless the stored
    /// version equals `expected_version`.
    fn update(
        &self,
        definition: TestDefinition,
        expected_version: u64,
    ) -> Result<TestDefinition, RepositoryError>;
    fn fetch(&self, id: &TestDefinitionId) -> Result<Option<TestDefinition>, RepositoryError>;
}

/// Storage abstraction for candidate sessions.
pub trait SessionRepository: Send + Sync {
    /// Fails with `ActiveSessionExists` when the pair already has a
    /// non-completed session and with `Conflict` when the id is taken.
    fn insert(&self, session: Session) -> Result<Session, RepositoryError>;
    /// Optimistic write: fails with `Conflict` unless the stored version equals
    /// `expected_version`. Returns the stored row with its bumped version.
    fn update(&self, session: Session, expected_version: u64) -> Result<Session, RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError>;
    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
        test_definition_id: &TestDefinitionId,
    ) -> Result<Vec<Session>, RepositoryError>;
}

/// Level ordering of the tests a selection procedure runs.
pub trait LevelRegistry: Send + Sync {
    /// Test one level below `id` in its procedure; `None` for level 1 or unassigned tests.
    fn previous_level(
        &self,
        id: &TestDefinitionId,
    ) -> Result<Option<TestDefinitionId>, RepositoryError>;
}

/// Source of question-count windows per test type condition.
pub trait ConditionRegistry: Send + Sync {
    fn condition(&self, id: &str) -> Result<Option<TestTypeCondition>, RepositoryError>;
}

/// Reports whether a definition is referenced by an active selection procedure.
pub trait UsageTracker: Send + Sync {
    fn in_active_use(&self, id: &TestDefinitionId) -> Result<bool, RepositoryError>;
}

/// Commission membership per selection procedure.
pub trait CommissionRepository: Send + Sync {
    fn members(&self, procedure_id: &str) -> Result<Option<Vec<CommissionMember>>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was modified concurrently")]
    Conflict,
    #[error("candidate already has an open session for this test")]
    ActiveSessionExists,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
