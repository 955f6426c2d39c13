use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::commission::CommissionMember;
use super::domain::{CandidateId, SessionId, TestDefinitionId};
use super::repository::{
    CommissionRepository, ConditionRegistry, LevelRegistry, RepositoryError, SessionRepository,
    TestDefinitionRepository, UsageTracker,
};
use super::session::{Session, SessionStatus};
use super::test_definition::{TestDefinition, TestTypeCondition};

/// Process-local store backing every repository seam. Cloning shares state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    definitions: Arc<Mutex<HashMap<TestDefinitionId, TestDefinition>>>,
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
    conditions: Arc<Mutex<HashMap<String, TestTypeCondition>>>,
    active_usage: Arc<Mutex<HashSet<TestDefinitionId>>>,
    commissions: Arc<Mutex<HashMap<String, Vec<CommissionMember>>>>,
    levels: Arc<Mutex<HashMap<String, BTreeMap<u32, TestDefinitionId>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_condition(&self, condition: TestTypeCondition) {
        lock(&self.conditions).insert(condition.id.clone(), condition);
    }

    /// Flag a definition as referenced (or no longer) by an active procedure.
    pub fn set_in_active_use(&self, id: &TestDefinitionId, active: bool) {
        let mut usage = lock(&self.active_usage);
        if active {
            usage.insert(id.clone());
        } else {
            usage.remove(id);
        }
    }

    pub fn set_commission(&self, procedure_id: impl Into<String>, members: Vec<CommissionMember>) {
        lock(&self.commissions).insert(procedure_id.into(), members);
    }

    /// Place a test at `level` of a procedure, replacing whatever held that level.
    pub fn assign_level(
        &self,
        procedure_id: impl Into<String>,
        level: u32,
        test_definition_id: TestDefinitionId,
    ) {
        lock(&self.levels)
            .entry(procedure_id.into())
            .or_default()
            .insert(level, test_definition_id);
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}

impl TestDefinitionRepository for InMemoryStore {
    fn insert(&self, definition: TestDefinition) -> Result<TestDefinition, RepositoryError> {
        let mut definitions = lock(&self.definitions);
        if definitions.contains_key(definition.id()) {
            return Err(RepositoryError::Conflict);
        }
        definitions.insert(definition.id().clone(), definition.clone());
        Ok(definition)
    }

    fn update(
        &self,
        definition: TestDefinition,
        expected_version: u64,
    ) -> Result<TestDefinition, RepositoryError> {
        let mut definitions = lock(&self.definitions);
        let stored = definitions
            .get_mut(definition.id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.version() != expected_version {
            return Err(RepositoryError::Conflict);
        }
        let definition = definition.with_version(expected_version + 1);
        *stored = definition.clone();
        Ok(definition)
    }

    fn fetch(&self, id: &TestDefinitionId) -> Result<Option<TestDefinition>, RepositoryError> {
        Ok(lock(&self.definitions).get(id).cloned())
    }
}

impl SessionRepository for InMemoryStore {
    fn insert(&self, session: Session) -> Result<Session, RepositoryError> {
        let mut sessions = lock(&self.sessions);
        let pair_taken = sessions.values().any(|existing| {
            existing.candidate_id == session.candidate_id
                && existing.test_definition_id == session.test_definition_id
                && existing.status != SessionStatus::Completed
        });
        if sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        if pair_taken {
            return Err(RepositoryError::ActiveSessionExists);
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(
        &self,
        mut session: Session,
        expected_version: u64,
    ) -> Result<Session, RepositoryError> {
        let mut sessions = lock(&self.sessions);
        let stored = sessions
            .get_mut(&session.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Conflict);
        }
        session.version = expected_version + 1;
        *stored = session.clone();
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        Ok(lock(&self.sessions).get(id).cloned())
    }

    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
        test_definition_id: &TestDefinitionId,
    ) -> Result<Vec<Session>, RepositoryError> {
        let sessions = lock(&self.sessions);
        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|session| {
                &session.candidate_id == candidate_id
                    && &session.test_definition_id == test_definition_id
            })
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            left.server_start_time
                .cmp(&right.server_start_time)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(matching)
    }
}

impl LevelRegistry for InMemoryStore {
    fn previous_level(
        &self,
        id: &TestDefinitionId,
    ) -> Result<Option<TestDefinitionId>, RepositoryError> {
        let levels = lock(&self.levels);
        let previous = levels.values().find_map(|plan| {
            let (level, _) = plan.iter().find(|(_, assigned)| *assigned == id)?;
            let below = level.checked_sub(1).filter(|below| *below > 0)?;
            plan.get(&below).cloned()
        });
        Ok(previous)
    }
}

impl ConditionRegistry for InMemoryStore {
    fn condition(&self, id: &str) -> Result<Option<TestTypeCondition>, RepositoryError> {
        Ok(lock(&self.conditions).get(id).cloned())
    }
}

impl UsageTracker for InMemoryStore {
    fn in_active_use(&self, id: &TestDefinitionId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.active_usage).contains(id))
    }
}

impl CommissionRepository for InMemoryStore {
    fn members(
        &self,
        procedure_id: &str,
    ) -> Result<Option<Vec<CommissionMember>>, RepositoryError> {
        Ok(lock(&self.commissions).get(procedure_id).cloned())
    }
}
