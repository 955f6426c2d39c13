use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{QuestionId, QuestionType, TestDefinitionId};
use super::question::{Question, ValidationError};

const CLONE_NAME_SUFFIX: &str = " (kópia)";

/// Question-count window a test type condition imposes on its tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTypeCondition {
    pub id: String,
    pub min_questions: usize,
    pub max_questions: usize,
}

impl TestTypeCondition {
    pub fn contains(&self, count: usize) -> bool {
        (self.min_questions..=self.max_questions).contains(&count)
    }
}

/// Metadata shared by every question of a test definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionSettings {
    pub name: String,
    pub condition_id: String,
    pub allowed_question_types: BTreeSet<QuestionType>,
    /// Minutes.
    pub recommended_duration: u32,
    pub recommended_score: f64,
}

/// An ordered, validated set of questions with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    id: TestDefinitionId,
    settings: DefinitionSettings,
    questions: Vec<Question>,
    approved: bool,
    approved_at: Option<DateTime<Utc>>,
    /// Bumped by the store on every update; used for optimistic writes.
    #[serde(default)]
    version: u64,
}

impl TestDefinition {
    /// Validate questions against the allowed types and the condition's count window.
    pub fn build(
        id: TestDefinitionId,
        settings: DefinitionSettings,
        questions: Vec<Question>,
        condition: &TestTypeCondition,
    ) -> Result<Self, ValidationError> {
        if settings.recommended_duration == 0 {
            return Err(ValidationError::InvalidDuration);
        }
        let questions = checked_questions(questions, &settings.allowed_question_types, condition)?;

        Ok(Self {
            id,
            settings,
            questions,
            approved: false,
            approved_at: None,
            version: 0,
        })
    }

    pub fn id(&self) -> &TestDefinitionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &DefinitionSettings {
        &self.settings
    }

    pub fn condition_id(&self) -> &str {
        &self.settings.condition_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id() == id)
    }

    pub fn allowed_question_types(&self) -> &BTreeSet<QuestionType> {
        &self.settings.allowed_question_types
    }

    pub fn recommended_duration(&self) -> u32 {
        self.settings.recommended_duration
    }

    pub fn recommended_score(&self) -> f64 {
        self.settings.recommended_score
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stamp the version a store assigned on write.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Approved definitions referenced by an active procedure are frozen.
    pub fn is_locked(&self, in_active_use: bool) -> bool {
        self.approved && in_active_use
    }

    pub fn approve(&mut self, now: DateTime<Utc>) {
        if !self.approved {
            self.approved = true;
            self.approved_at = Some(now);
        }
    }

    /// Independent, unapproved copy under a new id.
    pub fn clone_unapproved(&self, id: TestDefinitionId) -> Self {
        let mut settings = self.settings.clone();
        settings.name.push_str(CLONE_NAME_SUFFIX);
        Self {
            id,
            settings,
            questions: self.questions.clone(),
            approved: false,
            approved_at: None,
            version: 0,
        }
    }

    /// Swap in a new question array; the old one stays untouched on error.
    pub fn replace_questions(
        &mut self,
        questions: Vec<Question>,
        condition: &TestTypeCondition,
    ) -> Result<(), ValidationError> {
        self.questions =
            checked_questions(questions, &self.settings.allowed_question_types, condition)?;
        Ok(())
    }

    /// Insert or overwrite one question by id, re-validating the whole array.
    pub fn upsert_question(
        &mut self,
        question: Question,
        condition: &TestTypeCondition,
    ) -> Result<(), ValidationError> {
        let mut questions = self.questions.clone();
        match questions
            .iter()
            .position(|existing| existing.id() == question.id())
        {
            Some(index) => questions[index] = question,
            None => questions.push(question),
        }
        self.replace_questions(questions, condition)
    }
}

fn checked_questions(
    mut questions: Vec<Question>,
    allowed: &BTreeSet<QuestionType>,
    condition: &TestTypeCondition,
) -> Result<Vec<Question>, ValidationError> {
    if allowed.is_empty() {
        return Err(ValidationError::NoAllowedTypes);
    }

    let mut ids = HashSet::new();
    for question in &questions {
        if !allowed.contains(&question.question_type()) {
            return Err(ValidationError::TypeNotAllowed {
                question_id: question.id().clone(),
                question_type: question.question_type(),
            });
        }
        if !ids.insert(question.id().clone()) {
            return Err(ValidationError::DuplicateQuestionId(question.id().clone()));
        }
    }

    if !condition.contains(questions.len()) {
        return Err(ValidationError::QuestionCountOutOfRange {
            min: condition.min_questions,
            max: condition.max_questions,
            found: questions.len(),
        });
    }

    for (position, question) in questions.iter_mut().enumerate() {
        question.set_order(position as u32 + 1);
    }
    Ok(questions)
}
