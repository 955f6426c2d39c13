use std::collections::BTreeSet;

use super::common::*;
use crate::assessment::domain::{QuestionId, QuestionType, TestDefinitionId};
use crate::assessment::question::{Question, QuestionDraft, ValidationError};
use crate::assessment::test_definition::{TestDefinition, TestTypeCondition};

fn questions(drafts: &[QuestionDraft]) -> Vec<Question> {
    drafts
        .iter()
        .map(|draft| draft.validate().expect("valid draft"))
        .collect()
}

#[test]
fn build_rejects_types_outside_the_allowed_set() {
    let mut settings = settings(20, 1.0);
    settings.allowed_question_types = BTreeSet::from([QuestionType::SingleChoice]);

    match TestDefinition::build(
        TestDefinitionId::new("def-1"),
        settings,
        questions(&[single_choice("q1", 2, 0), true_false("q2", true)]),
        &condition(),
    ) {
        Err(ValidationError::TypeNotAllowed {
            question_id,
            question_type: QuestionType::TrueFalse,
        }) => assert_eq!(question_id, QuestionId::new("q2")),
        other => panic!("expected type not allowed, got {other:?}"),
    }
}

#[test]
fn build_enforces_the_condition_window() {
    let narrow = TestTypeCondition {
        id: CONDITION_ID.to_string(),
        min_questions: 2,
        max_questions: 3,
    };

    match TestDefinition::build(
        TestDefinitionId::new("def-1"),
        settings(20, 1.0),
        questions(&[single_choice("q1", 2, 0)]),
        &narrow,
    ) {
        Err(ValidationError::QuestionCountOutOfRange {
            min: 2,
            max: 3,
            found: 1,
        }) => {}
        other => panic!("expected count out of range, got {other:?}"),
    }

    let drafts: Vec<_> = (1..=4)
        .map(|n| single_choice(&format!("q{n}"), 2, 0))
        .collect();
    match TestDefinition::build(
        TestDefinitionId::new("def-1"),
        settings(20, 1.0),
        questions(&drafts),
        &narrow,
    ) {
        Err(ValidationError::QuestionCountOutOfRange { found: 4, .. }) => {}
        other => panic!("expected count out of range, got {other:?}"),
    }
}

#[test]
fn build_rejects_empty_allowed_types_zero_duration_and_duplicate_ids() {
    let mut no_types = settings(20, 1.0);
    no_types.allowed_question_types.clear();
    assert_eq!(
        TestDefinition::build(
            TestDefinitionId::new("def-1"),
            no_types,
            questions(&[single_choice("q1", 2, 0)]),
            &condition(),
        ),
        Err(ValidationError::NoAllowedTypes)
    );

    assert_eq!(
        TestDefinition::build(
            TestDefinitionId::new("def-1"),
            settings(0, 1.0),
            questions(&[single_choice("q1", 2, 0)]),
            &condition(),
        ),
        Err(ValidationError::InvalidDuration)
    );

    assert_eq!(
        TestDefinition::build(
            TestDefinitionId::new("def-1"),
            settings(20, 1.0),
            questions(&[single_choice("q1", 2, 0), true_false("q1", false)]),
            &condition(),
        ),
        Err(ValidationError::DuplicateQuestionId(QuestionId::new("q1")))
    );
}

#[test]
fn build_renumbers_question_order() {
    let mut first = single_choice("q1", 2, 0);
    first.order = 7;
    let mut second = open_ended("q2");
    second.order = 3;

    let definition = build_definition(&[first, second], 1.0);
    let orders: Vec<u32> = definition.questions().iter().map(|q| q.order()).collect();
    assert_eq!(orders, vec![1, 2]);
}

#[test]
fn clone_is_an_unapproved_independent_copy() {
    let mut original = build_definition(&[single_choice("q1", 3, 1), true_false("q2", false)], 1.0);
    original.approve(t0());
    assert!(original.is_approved());
    assert_eq!(original.approved_at(), Some(t0()));

    let mut copy = original.clone_unapproved(TestDefinitionId::new("def-copy"));
    assert_eq!(copy.id(), &TestDefinitionId::new("def-copy"));
    assert!(!copy.is_approved());
    assert_eq!(copy.approved_at(), None);
    assert_eq!(copy.name(), "Odborný test (kópia)");
    assert_eq!(copy.questions(), original.questions());

    copy.replace_questions(questions(&[open_ended("q9")]), &condition())
        .expect("copy is editable");
    assert_eq!(original.questions().len(), 2);
    assert_eq!(copy.questions().len(), 1);
}

#[test]
fn lock_requires_approval_and_active_use() {
    let mut definition = build_definition(&[single_choice("q1", 2, 0)], 1.0);
    assert!(!definition.is_locked(true));
    definition.approve(t0());
    assert!(!definition.is_locked(false));
    assert!(definition.is_locked(true));
}

#[test]
fn upsert_replaces_by_id_or_appends() {
    let mut definition =
        build_definition(&[single_choice("q1", 2, 0), single_choice("q2", 2, 1)], 1.0);

    let mut edited = single_choice("q1", 3, 2);
    edited.text = "Upravená otázka".to_string();
    definition
        .upsert_question(edited.validate().expect("valid"), &condition())
        .expect("upsert existing");
    assert_eq!(definition.questions().len(), 2);
    assert_eq!(definition.questions()[0].text(), "Upravená otázka");
    assert_eq!(definition.questions()[0].answer_count(), 3);

    definition
        .upsert_question(true_false("q3", true).validate().expect("valid"), &condition())
        .expect("append new");
    let ids: Vec<&str> = definition.questions().iter().map(|q| q.id().as_str()).collect();
    assert_eq!(ids, vec!["q1", "q2", "q3"]);
    assert_eq!(definition.questions()[2].order(), 3);
}

#[test]
fn failed_replace_leaves_questions_untouched() {
    let mut definition = build_definition(&[single_choice("q1", 2, 0)], 1.0);
    let before = definition.questions().to_vec();
    let narrow = TestTypeCondition {
        id: CONDITION_ID.to_string(),
        min_questions: 1,
        max_questions: 1,
    };

    let result = definition.upsert_question(open_ended("q2").validate().expect("valid"), &narrow);
    assert!(matches!(
        result,
        Err(ValidationError::QuestionCountOutOfRange { found: 2, .. })
    ));
    assert_eq!(definition.questions(), before.as_slice());
}
