use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::assessment::commission::CommissionMember;
use crate::assessment::domain::{
    Answer, CandidateId, QuestionId, QuestionType, SessionId, TestDefinitionId,
};
use crate::assessment::memory::InMemoryStore;
use crate::assessment::question::QuestionDraft;
use crate::assessment::repository::{
    CommissionRepository, ConditionRegistry, LevelRegistry, RepositoryError, SessionRepository,
    TestDefinitionRepository, UsageTracker,
};
use crate::assessment::service::AssessmentService;
use crate::assessment::session::{ManualClock, Session};
use crate::assessment::test_definition::{DefinitionSettings, TestDefinition, TestTypeCondition};
use crate::config::AssessmentConfig;

pub(super) const CONDITION_ID: &str = "written-test";

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn condition() -> TestTypeCondition {
    TestTypeCondition {
        id: CONDITION_ID.to_string(),
        min_questions: 1,
        max_questions: 10,
    }
}

pub(super) fn all_types() -> BTreeSet<QuestionType> {
    QuestionType::ALL.into_iter().collect()
}

pub(super) fn settings(duration_minutes: u32, recommended_score: f64) -> DefinitionSettings {
    DefinitionSettings {
        name: "Odborný test".to_string(),
        condition_id: CONDITION_ID.to_string(),
        allowed_question_types: all_types(),
        recommended_duration: duration_minutes,
        recommended_score,
    }
}

fn choices(texts: &[&str], correct: &[usize]) -> Vec<Answer> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| Answer::new(index, *text, correct.contains(&index)))
        .collect()
}

pub(super) fn single_choice(id: &str, answers: usize, correct: usize) -> QuestionDraft {
    let texts = ["Bratislava", "Košice", "Žilina", "Nitra", "Prešov", "Trnava"];
    let mut draft = QuestionDraft::new(
        QuestionId::new(id),
        format!("Question {id}"),
        1,
        QuestionType::SingleChoice,
    );
    draft.answers = choices(&texts[..answers], &[correct]);
    draft
}

pub(super) fn multiple_choice(id: &str, answers: usize, correct: &[usize]) -> QuestionDraft {
    let texts = ["zákon", "vyhláška", "nariadenie", "smernica", "uznesenie", "pokyn"];
    let mut draft = QuestionDraft::new(
        QuestionId::new(id),
        format!("Question {id}"),
        2,
        QuestionType::MultipleChoice,
    );
    draft.answers = choices(&texts[..answers], correct);
    draft
}

pub(super) fn true_false(id: &str, is_true: bool) -> QuestionDraft {
    let mut draft = QuestionDraft::new(
        QuestionId::new(id),
        format!("Statement {id}"),
        1,
        QuestionType::TrueFalse,
    );
    draft
        .set_correct(if is_true { 0 } else { 1 }, true)
        .expect("true/false has two answers");
    draft
}

pub(super) fn open_ended(id: &str) -> QuestionDraft {
    QuestionDraft::new(
        QuestionId::new(id),
        format!("Essay {id}"),
        5,
        QuestionType::OpenEnded,
    )
}

pub(super) fn build_definition(drafts: &[QuestionDraft], recommended_score: f64) -> TestDefinition {
    let questions = drafts
        .iter()
        .map(|draft| draft.validate().expect("fixture question is valid"))
        .collect();
    TestDefinition::build(
        TestDefinitionId::new("def-fixture"),
        settings(1, recommended_score),
        questions,
        &condition(),
    )
    .expect("fixture definition is valid")
}

pub(super) fn candidate() -> CandidateId {
    CandidateId::new("cand-001")
}

pub(super) fn other_candidate() -> CandidateId {
    CandidateId::new("cand-002")
}

pub(super) struct Harness {
    pub(super) service: Arc<AssessmentService<InMemoryStore>>,
    pub(super) store: Arc<InMemoryStore>,
    pub(super) clock: Arc<ManualClock>,
}

pub(super) fn harness() -> Harness {
    harness_with(AssessmentConfig::default())
}

pub(super) fn harness_with(config: AssessmentConfig) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    store.add_condition(condition());
    let clock = Arc::new(ManualClock::new(t0()));
    let service = Arc::new(AssessmentService::new(store.clone(), clock.clone(), &config));
    Harness {
        service,
        store,
        clock,
    }
}

/// Three single-choice questions worth a point each, pass mark 2, one minute.
pub(super) fn seed_three_question_test(harness: &Harness) -> TestDefinition {
    harness
        .service
        .create_definition(
            settings(1, 2.0),
            vec![
                single_choice("q1", 3, 0),
                single_choice("q2", 3, 1),
                single_choice("q3", 3, 2),
            ],
        )
        .expect("seed definition")
}

pub(super) fn members(total: usize, chairmen: usize) -> Vec<CommissionMember> {
    (0..total)
        .map(|index| CommissionMember::new(format!("user-{index}"), index < chairmen))
        .collect()
}

/// Store whose every call fails as if the database were down.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl TestDefinitionRepository for UnavailableStore {
    fn insert(&self, _definition: TestDefinition) -> Result<TestDefinition, RepositoryError> {
        offline()
    }

    fn update(
        &self,
        _definition: TestDefinition,
        _expected_version: u64,
    ) -> Result<TestDefinition, RepositoryError> {
        offline()
    }

    fn fetch(&self, _id: &TestDefinitionId) -> Result<Option<TestDefinition>, RepositoryError> {
        offline()
    }
}

impl SessionRepository for UnavailableStore {
    fn insert(&self, _session: Session) -> Result<Session, RepositoryError> {
        offline()
    }

    fn update(
        &self,
        _session: Session,
        _expected_version: u64,
    ) -> Result<Session, RepositoryError> {
        offline()
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        offline()
    }

    fn for_candidate(
        &self,
        _candidate_id: &CandidateId,
        _test_definition_id: &TestDefinitionId,
    ) -> Result<Vec<Session>, RepositoryError> {
        offline()
    }
}

impl LevelRegistry for UnavailableStore {
    fn previous_level(
        &self,
        _id: &TestDefinitionId,
    ) -> Result<Option<TestDefinitionId>, RepositoryError> {
        offline()
    }
}

impl ConditionRegistry for UnavailableStore {
    fn condition(&self, _id: &str) -> Result<Option<TestTypeCondition>, RepositoryError> {
        offline()
    }
}

impl UsageTracker for UnavailableStore {
    fn in_active_use(&self, _id: &TestDefinitionId) -> Result<bool, RepositoryError> {
        offline()
    }
}

impl CommissionRepository for UnavailableStore {
    fn members(
        &self,
        _procedure_id: &str,
    ) -> Result<Option<Vec<CommissionMember>>, RepositoryError> {
        offline()
    }
}

/// Reads succeed from the wrapped store; session writes fail.
pub(super) struct ReadOnlySessions {
    pub(super) inner: InMemoryStore,
}

impl TestDefinitionRepository for ReadOnlySessions {
    fn insert(&self, definition: TestDefinition) -> Result<TestDefinition, RepositoryError> {
        TestDefinitionRepository::insert(&self.inner, definition)
    }

    fn update(
        &self,
        definition: TestDefinition,
        expected_version: u64,
    ) -> Result<TestDefinition, RepositoryError> {
        TestDefinitionRepository::update(&self.inner, definition, expected_version)
    }

    fn fetch(&self, id: &TestDefinitionId) -> Result<Option<TestDefinition>, RepositoryError> {
        TestDefinitionRepository::fetch(&self.inner, id)
    }
}

impl SessionRepository for ReadOnlySessions {
    fn insert(&self, session: Session) -> Result<Session, RepositoryError> {
        SessionRepository::insert(&self.inner, session)
    }

    fn update(
        &self,
        _session: Session,
        _expected_version: u64,
    ) -> Result<Session, RepositoryError> {
        Err(RepositoryError::Unavailable("write failed".to_string()))
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        SessionRepository::fetch(&self.inner, id)
    }

    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
        test_definition_id: &TestDefinitionId,
    ) -> Result<Vec<Session>, RepositoryError> {
        self.inner.for_candidate(candidate_id, test_definition_id)
    }
}

impl LevelRegistry for ReadOnlySessions {
    fn previous_level(
        &self,
        id: &TestDefinitionId,
    ) -> Result<Option<TestDefinitionId>, RepositoryError> {
        self.inner.previous_level(id)
    }
}

impl ConditionRegistry for ReadOnlySessions {
    fn condition(&self, id: &str) -> Result<Option<TestTypeCondition>, RepositoryError> {
        self.inner.condition(id)
    }
}

impl UsageTracker for ReadOnlySessions {
    fn in_active_use(&self, id: &TestDefinitionId) -> Result<bool, RepositoryError> {
        self.inner.in_active_use(id)
    }
}

impl CommissionRepository for ReadOnlySessions {
    fn members(
        &self,
        procedure_id: &str,
    ) -> Result<Option<Vec<CommissionMember>>, RepositoryError> {
        self.inner.members(procedure_id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
