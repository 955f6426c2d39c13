//! Timed candidate sessions.
//!
//! A stored session holds only absolute instants (`server_start_time`,
//! `duration_seconds`). Remaining time is recomputed against the server clock
//! on every read, and expiry is applied lazily: a session persisted as
//! `IN_PROGRESS` stops accepting writes once its deadline has passed, whatever the
//! stored status says.

mod clock;
mod engine;
mod locks;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::SessionEngine;
pub(crate) use locks::KeyedLocks;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CandidateId, Letter, QuestionId, QuestionType, SessionId, TestDefinitionId};
use super::question::Question;
use super::scoring::ScoreOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "NOT_STARTED",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
        }
    }
}

/// Why a session reached `COMPLETED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    Submitted,
    TimedOut,
}

/// Candidate's response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerResponse {
    /// Single-choice and true/false.
    Choice(Letter),
    /// Multiple-choice; an empty set clears the answer.
    Choices(BTreeSet<Letter>),
    /// Open-ended.
    Text(String),
}

impl AnswerResponse {
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerResponse::Choice(_) => false,
            AnswerResponse::Choices(letters) => letters.is_empty(),
            AnswerResponse::Text(text) => text.trim().is_empty(),
        }
    }

    /// Shape matches the question type and every letter names an existing answer.
    pub fn fits(&self, question: &Question) -> bool {
        let in_range = |letter: &Letter| {
            letter
                .index()
                .map(|index| index < question.answer_count())
                .unwrap_or(false)
        };
        match (question.question_type(), self) {
            (
                QuestionType::SingleChoice | QuestionType::TrueFalse,
                AnswerResponse::Choice(letter),
            ) => in_range(letter),
            (QuestionType::MultipleChoice, AnswerResponse::Choices(letters)) => {
                letters.iter().all(in_range)
            }
            (QuestionType::OpenEnded, AnswerResponse::Text(_)) => true,
            _ => false,
        }
    }
}

/// Domain failures of session operations. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("candidate already has an active session for this test")]
    AlreadyActive,
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("test {0} of the previous level has not been passed")]
    PreviousLevelNotPassed(TestDefinitionId),
    #[error("session is already completed")]
    AlreadyCompleted,
    #[error("session is not in progress or its time has run out")]
    Expired,
    #[error("session belongs to another candidate")]
    Unauthorized,
    #[error("session has not been completed yet")]
    NotCompleted,
    #[error("question {0} is not part of this test")]
    UnknownQuestion(QuestionId),
    #[error("response does not fit {question_type} question {question_id}")]
    InvalidResponse {
        question_id: QuestionId,
        question_type: QuestionType,
    },
}

/// One candidate's attempt at a test definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub test_definition_id: TestDefinitionId,
    pub candidate_id: CandidateId,
    pub status: SessionStatus,
    pub server_start_time: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub answers: BTreeMap<QuestionId, AnswerResponse>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion: Option<CompletionReason>,
    pub result: Option<ScoreOutcome>,
    /// Bumped by the store on every update; used for optimistic writes.
    #[serde(default)]
    pub version: u64,
}

impl Session {
    pub fn new(
        id: SessionId,
        test_definition_id: TestDefinitionId,
        candidate_id: CandidateId,
        duration_seconds: i64,
    ) -> Self {
        Self {
            id,
            test_definition_id,
            candidate_id,
            status: SessionStatus::NotStarted,
            server_start_time: None,
            duration_seconds: duration_seconds.max(0),
            answers: BTreeMap::new(),
            last_accessed_at: None,
            completed_at: None,
            completion: None,
            result: None,
            version: 0,
        }
    }

    /// `NOT_STARTED -> IN_PROGRESS`, pinning the server start time.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::NotStarted => {
                self.status = SessionStatus::InProgress;
                self.server_start_time = Some(now);
                self.last_accessed_at = Some(now);
                Ok(())
            }
            SessionStatus::InProgress => Err(SessionError::AlreadyActive),
            SessionStatus::Completed => Err(SessionError::AlreadyCompleted),
        }
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.server_start_time
            .map(|start| start + Duration::seconds(self.duration_seconds))
    }

    /// Clamp `now` so it never moves behind an instant this session already observed.
    pub fn observe(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let effective = match self.last_accessed_at {
            Some(seen) if seen > now => seen,
            _ => now,
        };
        self.last_accessed_at = Some(effective);
        effective
    }

    /// Seconds left, recomputed from the start instant. Never negative.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        match (self.status, self.server_start_time) {
            (SessionStatus::NotStarted, _) => self.duration_seconds,
            (SessionStatus::InProgress, Some(start)) => {
                let elapsed = (now - start).num_seconds().max(0);
                (self.duration_seconds - elapsed).clamp(0, self.duration_seconds)
            }
            _ => 0,
        }
    }

    /// In progress in storage but past its deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::InProgress
            && self.deadline().map(|deadline| now >= deadline).unwrap_or(true)
    }

    /// Accept a write only while in progress and strictly before the deadline.
    pub fn accepts_answers(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::InProgress && !self.is_overdue(now)
    }

    pub fn record(
        &mut self,
        now: DateTime<Utc>,
        question_id: QuestionId,
        response: AnswerResponse,
    ) -> Result<(), SessionError> {
        if !self.accepts_answers(now) {
            return Err(SessionError::Expired);
        }
        self.answers.insert(question_id, response);
        Ok(())
    }

    pub fn answered_count(&self) -> usize {
        self.answers
            .values()
            .filter(|response| !response.is_blank())
            .count()
    }

    /// Freeze the session. `completed_at` never lands after the deadline.
    pub fn complete(
        &mut self,
        now: DateTime<Utc>,
        reason: CompletionReason,
        outcome: ScoreOutcome,
    ) -> Result<(), SessionError> {
        if self.status == SessionStatus::Completed {
            return Err(SessionError::AlreadyCompleted);
        }
        let completed_at = match self.deadline() {
            Some(deadline) if deadline < now => deadline,
            _ => now,
        };
        self.status = SessionStatus::Completed;
        self.completed_at = Some(completed_at);
        self.completion = Some(reason);
        self.result = Some(outcome);
        Ok(())
    }

    pub fn status_view(&self, now: DateTime<Utc>) -> SessionStatusView {
        SessionStatusView {
            session_id: self.id.clone(),
            status: self.status,
            remaining_seconds: self.remaining_seconds(now),
            answered_count: self.answered_count(),
            server_start_time: self.server_start_time,
            deadline: self.deadline(),
            completion: self.completion,
        }
    }
}

/// Frozen outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResultView {
    pub session_id: SessionId,
    pub test_definition_id: TestDefinitionId,
    pub completed_at: DateTime<Utc>,
    pub completion: CompletionReason,
    pub outcome: ScoreOutcome,
}

impl SessionResultView {
    /// `None` until the session is completed.
    pub fn from_session(session: &Session) -> Option<Self> {
        if session.status != SessionStatus::Completed {
            return None;
        }
        Some(Self {
            session_id: session.id.clone(),
            test_definition_id: session.test_definition_id.clone(),
            completed_at: session.completed_at?,
            completion: session.completion?,
            outcome: session.result.clone()?,
        })
    }
}

/// What a polling client sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusView {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub remaining_seconds: i64,
    pub answered_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionReason>,
}
