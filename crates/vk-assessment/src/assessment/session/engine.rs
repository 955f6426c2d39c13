use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::assessment::domain::{CandidateId, QuestionId, SessionId, TestDefinitionId};
use crate::assessment::repository::{
    LevelRegistry, RepositoryError, SessionRepository, TestDefinitionRepository,
};
use crate::assessment::scoring::{ScoreOutcome, ScoringConfig, ScoringEngine};
use crate::assessment::service::AssessmentServiceError;
use crate::assessment::test_definition::TestDefinition;
use crate::config::AssessmentConfig;

use super::clock::Clock;
use super::locks::KeyedLocks;
use super::{
    AnswerResponse, CompletionReason, Session, SessionError, SessionResultView, SessionStatus,
    SessionStatusView,
};

fn next_session_id() -> SessionId {
    SessionId(format!("ses-{}", Uuid::new_v4()))
}

type PairKey = (CandidateId, TestDefinitionId);

/// Drives sessions through `NOT_STARTED -> IN_PROGRESS -> COMPLETED`.
///
/// Writers of one session are serialized by a per-session lock, and `start`
/// by a per-(candidate, test) lock; the store's optimistic version check
/// backs both up across processes. Lock order is always pair before session.
pub struct SessionEngine<S, D> {
    sessions: Arc<S>,
    definitions: Arc<D>,
    clock: Arc<dyn Clock>,
    scoring: ScoringEngine,
    default_duration_minutes: u32,
    allow_retake: bool,
    session_locks: KeyedLocks<SessionId>,
    start_locks: KeyedLocks<PairKey>,
}

impl<S, D> SessionEngine<S, D>
where
    S: SessionRepository + 'static,
    D: TestDefinitionRepository + LevelRegistry + 'static,
{
    pub fn new(
        sessions: Arc<S>,
        definitions: Arc<D>,
        clock: Arc<dyn Clock>,
        config: &AssessmentConfig,
    ) -> Self {
        Self {
            sessions,
            definitions,
            clock,
            scoring: ScoringEngine::new(ScoringConfig {
                multiple_choice: config.multiple_choice_policy,
            }),
            default_duration_minutes: config.default_duration_minutes,
            allow_retake: config.allow_retake,
            session_locks: KeyedLocks::default(),
            start_locks: KeyedLocks::default(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open a new attempt for the pair.
    pub fn start(
        &self,
        candidate_id: &CandidateId,
        test_definition_id: &TestDefinitionId,
    ) -> Result<Session, AssessmentServiceError> {
        let key = (candidate_id.clone(), test_definition_id.clone());
        self.start_locks
            .run(&key, || self.start_locked(candidate_id, test_definition_id))
    }

    fn start_locked(
        &self,
        candidate_id: &CandidateId,
        test_definition_id: &TestDefinitionId,
    ) -> Result<Session, AssessmentServiceError> {
        let definition = self.definition(test_definition_id)?;
        self.ensure_previous_level_passed(candidate_id, test_definition_id)?;
        let now = self.clock.now();

        for existing in self
            .sessions
            .for_candidate(candidate_id, test_definition_id)?
        {
            let existing = if existing.is_overdue(now) {
                self.session_locks
                    .run(&existing.id, || self.settle_locked(&existing.id))?
            } else {
                existing
            };

            match existing.status {
                SessionStatus::Completed if self.allow_retake => continue,
                SessionStatus::Completed => return Err(SessionError::AlreadyCompleted.into()),
                SessionStatus::NotStarted | SessionStatus::InProgress => {
                    return Err(SessionError::AlreadyActive.into())
                }
            }
        }

        let minutes = match definition.recommended_duration() {
            0 => self.default_duration_minutes,
            minutes => minutes,
        };
        let mut session = Session::new(
            next_session_id(),
            test_definition_id.clone(),
            candidate_id.clone(),
            i64::from(minutes) * 60,
        );
        session.begin(now)?;

        let stored = self.sessions.insert(session).map_err(|err| match err {
            RepositoryError::ActiveSessionExists => {
                AssessmentServiceError::from(SessionError::AlreadyActive)
            }
            other => other.into(),
        })?;

        info!(
            session_id = %stored.id,
            candidate_id = %candidate_id,
            test_definition_id = %test_definition_id,
            duration_seconds = stored.duration_seconds,
            "session started"
        );
        Ok(stored)
    }

    /// Tests above level 1 open only after a completed, passed attempt at the
    /// level below. Overdue attempts there are settled first.
    fn ensure_previous_level_passed(
        &self,
        candidate_id: &CandidateId,
        test_definition_id: &TestDefinitionId,
    ) -> Result<(), AssessmentServiceError> {
        let Some(previous) = self.definitions.previous_level(test_definition_id)? else {
            return Ok(());
        };

        let now = self.clock.now();
        for attempt in self.sessions.for_candidate(candidate_id, &previous)? {
            let attempt = if attempt.is_overdue(now) {
                self.session_locks
                    .run(&attempt.id, || self.settle_locked(&attempt.id))?
            } else {
                attempt
            };
            let passed = attempt.status == SessionStatus::Completed
                && attempt.result.as_ref().map(|outcome| outcome.passed).unwrap_or(false);
            if passed {
                return Ok(());
            }
        }

        warn!(
            candidate_id = %candidate_id,
            test_definition_id = %test_definition_id,
            previous_level = %previous,
            "start rejected before previous level was passed"
        );
        Err(SessionError::PreviousLevelNotPassed(previous).into())
    }

    /// Store a response. Past the deadline the session is closed instead and
    /// the write is rejected with `Expired`; earlier answers are kept and scored.
    pub fn record_answer(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
        question_id: QuestionId,
        response: AnswerResponse,
    ) -> Result<SessionStatusView, AssessmentServiceError> {
        self.session_locks.run(session_id, || {
            let mut session = self.owned(candidate_id, session_id)?;
            if session.status != SessionStatus::InProgress {
                return Err(SessionError::Expired.into());
            }

            let now = session.observe(self.clock.now());
            if session.is_overdue(now) {
                self.finalize(session, now, CompletionReason::TimedOut)?;
                warn!(session_id = %session_id, "answer rejected after deadline");
                return Err(SessionError::Expired.into());
            }

            let definition = self.definition(&session.test_definition_id)?;
            let question = definition
                .question(&question_id)
                .ok_or_else(|| SessionError::UnknownQuestion(question_id.clone()))?;
            if !response.fits(question) {
                return Err(SessionError::InvalidResponse {
                    question_id: question_id.clone(),
                    question_type: question.question_type(),
                }
                .into());
            }

            let expected = session.version;
            session.record(now, question_id.clone(), response)?;
            let stored = self.sessions.update(session, expected)?;

            debug!(
                session_id = %session_id,
                question_id = %question_id,
                answered = stored.answered_count(),
                "answer recorded"
            );
            Ok(stored.status_view(now))
        })
    }

    /// Close the session and freeze its score. A call arriving after the
    /// deadline completes it as timed out, stamped at the deadline.
    pub fn submit(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
    ) -> Result<ScoreOutcome, AssessmentServiceError> {
        self.session_locks.run(session_id, || {
            let mut session = self.owned(candidate_id, session_id)?;
            if session.status == SessionStatus::Completed {
                return Err(SessionError::AlreadyCompleted.into());
            }

            let now = session.observe(self.clock.now());
            let reason = if session.is_overdue(now) {
                CompletionReason::TimedOut
            } else {
                CompletionReason::Submitted
            };
            let (_, outcome) = self.finalize(session, now, reason)?;
            Ok(outcome)
        })
    }

    /// Poll a session. Remaining time is recomputed on every call and an
    /// overdue session is closed before the view is returned.
    pub fn status(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
    ) -> Result<SessionStatusView, AssessmentServiceError> {
        self.session_locks.run(session_id, || {
            let mut session = self.owned(candidate_id, session_id)?;
            if session.status == SessionStatus::Completed {
                return Ok(session.status_view(self.clock.now()));
            }

            let seen = session.last_accessed_at;
            let now = session.observe(self.clock.now());
            if session.is_overdue(now) {
                let (closed, _) = self.finalize(session, now, CompletionReason::TimedOut)?;
                return Ok(closed.status_view(now));
            }

            if session.last_accessed_at != seen {
                let expected = session.version;
                session = self.sessions.update(session, expected)?;
            }
            Ok(session.status_view(now))
        })
    }

    /// Frozen result of a completed session.
    pub fn result(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
    ) -> Result<SessionResultView, AssessmentServiceError> {
        self.session_locks.run(session_id, || {
            let session = self.owned(candidate_id, session_id)?;
            let session = if session.is_overdue(self.clock.now()) {
                self.settle_locked(session_id)?
            } else {
                session
            };
            SessionResultView::from_session(&session)
                .ok_or_else(|| SessionError::NotCompleted.into())
        })
    }

    /// Apply lazy expiry to a stored session. Caller holds the session lock.
    fn settle_locked(&self, session_id: &SessionId) -> Result<Session, AssessmentServiceError> {
        let mut session = self
            .sessions
            .fetch(session_id)?
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        let now = session.observe(self.clock.now());
        if session.is_overdue(now) {
            let (closed, _) = self.finalize(session, now, CompletionReason::TimedOut)?;
            return Ok(closed);
        }
        Ok(session)
    }

    fn finalize(
        &self,
        mut session: Session,
        now: DateTime<Utc>,
        reason: CompletionReason,
    ) -> Result<(Session, ScoreOutcome), AssessmentServiceError> {
        let definition = self.definition(&session.test_definition_id)?;
        let outcome = self.scoring.score_session(&session, &definition);

        let expected = session.version;
        session.complete(now, reason, outcome.clone())?;
        let stored = self.sessions.update(session, expected).map_err(|err| {
            error!(error = %err, "failed to persist completed session");
            err
        })?;

        info!(
            session_id = %stored.id,
            reason = ?reason,
            score = outcome.score,
            max_score = outcome.max_score,
            passed = outcome.passed,
            "session completed"
        );
        Ok((stored, outcome))
    }

    fn owned(
        &self,
        candidate_id: &CandidateId,
        session_id: &SessionId,
    ) -> Result<Session, AssessmentServiceError> {
        let session = self
            .sessions
            .fetch(session_id)?
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        if &session.candidate_id != candidate_id {
            warn!(session_id = %session_id, "session accessed by another candidate");
            return Err(SessionError::Unauthorized.into());
        }
        Ok(session)
    }

    fn definition(&self, id: &TestDefinitionId) -> Result<TestDefinition, AssessmentServiceError> {
        self.definitions
            .fetch(id)?
            .ok_or_else(|| AssessmentServiceError::DefinitionNotFound(id.clone()))
    }
}
