use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use vk_assessment::assessment::domain::{FALSE_ANSWER_TEXT, TRUE_ANSWER_TEXT};
use vk_assessment::assessment::{
    Answer, AssessmentService, AssessmentServiceError, Clock, CommissionMember,
    DefinitionSettings, InMemoryStore, QuestionDraft, QuestionId, QuestionType, TestDefinition,
    TestTypeCondition,
};
use vk_assessment::config::AssessmentConfig;

pub(crate) const WRITTEN_TEST_CONDITION: &str = "written-test";
pub(crate) const SAMPLE_PROCEDURE: &str = "vk-2025-001";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store preloaded with the written-test condition and a sample commission.
pub(crate) fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.add_condition(TestTypeCondition {
        id: WRITTEN_TEST_CONDITION.to_string(),
        min_questions: 1,
        max_questions: 40,
    });
    store.set_commission(
        SAMPLE_PROCEDURE,
        vec![
            CommissionMember::new("usr-chair", true),
            CommissionMember::new("usr-hr", false),
            CommissionMember::new("usr-expert", false),
        ],
    );
    store
}

/// Service over a seeded store, with one sample test definition ready for
/// sessions as level 1 of the sample procedure.
pub(crate) fn bootstrap(
    clock: Arc<dyn Clock>,
    config: &AssessmentConfig,
) -> Result<(Arc<AssessmentService<InMemoryStore>>, TestDefinition), AssessmentServiceError> {
    let service = Arc::new(AssessmentService::new(seeded_store(), clock, config));
    let definition = service.create_definition(sample_settings(), sample_questions())?;
    service
        .store()
        .assign_level(SAMPLE_PROCEDURE, 1, definition.id().clone());
    Ok((service, definition))
}

pub(crate) fn sample_settings() -> DefinitionSettings {
    DefinitionSettings {
        name: "Všeobecný test".to_string(),
        condition_id: WRITTEN_TEST_CONDITION.to_string(),
        allowed_question_types: QuestionType::ALL.into_iter().collect::<BTreeSet<_>>(),
        recommended_duration: 20,
        recommended_score: 3.0,
    }
}

pub(crate) fn sample_questions() -> Vec<QuestionDraft> {
    let mut constitution = QuestionDraft::new(
        QuestionId::new("q-constitution"),
        "Kedy bola prijatá Ústava Slovenskej republiky?",
        1,
        QuestionType::SingleChoice,
    );
    constitution.answers = vec![
        Answer::new(0, "1. septembra 1992", true),
        Answer::new(1, "1. januára 1993", false),
        Answer::new(2, "17. novembra 1989", false),
    ];

    let mut bodies = QuestionDraft::new(
        QuestionId::new("q-bodies"),
        "Ktoré orgány sú ústrednými orgánmi štátnej správy?",
        2,
        QuestionType::MultipleChoice,
    );
    bodies.answers = vec![
        Answer::new(0, "ministerstvá", true),
        Answer::new(1, "obecné úrady", false),
        Answer::new(2, "Štatistický úrad SR", true),
        Answer::new(3, "vyššie územné celky", false),
    ];

    let mut oath = QuestionDraft::new(
        QuestionId::new("q-oath"),
        "Štátny zamestnanec je povinný zložiť sľub.",
        1,
        QuestionType::TrueFalse,
    );
    oath.answers = vec![
        Answer::new(0, TRUE_ANSWER_TEXT, true),
        Answer::new(1, FALSE_ANSWER_TEXT, false),
    ];

    let essay = QuestionDraft::new(
        QuestionId::new("q-essay"),
        "Opíšte úlohy výberovej komisie.",
        5,
        QuestionType::OpenEnded,
    );

    vec![constitution, bodies, oath, essay]
}
