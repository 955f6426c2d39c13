use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::commission::CommissionMember;
use super::domain::{CandidateId, QuestionId, SessionId, TestDefinitionId};
use super::question::QuestionDraft;
use super::repository::RepositoryError;
use super::service::{AssessmentService, AssessmentServiceError, AssessmentStore};
use super::session::{AnswerResponse, SessionError};

/// Header carrying the authenticated candidate, set by the identity layer.
pub const CANDIDATE_HEADER: &str = "x-candidate-id";

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub test_definition_id: TestDefinitionId,
}

#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub question_id: QuestionId,
    pub response: AnswerResponse,
}

#[derive(Debug, Deserialize)]
pub struct CommissionRequest {
    pub members: Vec<CommissionMember>,
}

/// Router exposing exam sessions, test authoring, and commission checks.
pub fn assessment_router<R>(service: Arc<AssessmentService<R>>) -> Router
where
    R: AssessmentStore + 'static,
{
    Router::new()
        .route("/api/v1/sessions", post(start_handler::<R>))
        .route("/api/v1/sessions/:session_id", get(status_handler::<R>))
        .route("/api/v1/sessions/:session_id/answers", put(answer_handler::<R>))
        .route("/api/v1/sessions/:session_id/submit", post(submit_handler::<R>))
        .route("/api/v1/sessions/:session_id/result", get(result_handler::<R>))
        .route(
            "/api/v1/test-definitions/:id/questions",
            put(save_question_handler::<R>),
        )
        .route(
            "/api/v1/test-definitions/:id/clone",
            post(clone_handler::<R>),
        )
        .route(
            "/api/v1/test-definitions/:id/approve",
            post(approve_handler::<R>),
        )
        .route(
            "/api/v1/commission/validity",
            post(commission_handler::<R>),
        )
        .route(
            "/api/v1/procedures/:procedure_id/commission/validity",
            get(procedure_commission_handler::<R>),
        )
        .with_state(service)
}

fn candidate(headers: &HeaderMap) -> Result<CandidateId, Response> {
    headers
        .get(CANDIDATE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(CandidateId::new)
        .ok_or_else(|| {
            let payload = json!({
                "error": format!("missing {CANDIDATE_HEADER} header"),
                "code": "MISSING_PRINCIPAL",
            });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
}

pub(crate) fn status_for(error: &AssessmentServiceError) -> StatusCode {
    match error {
        AssessmentServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssessmentServiceError::Session(session) => match session {
            SessionError::AlreadyActive
            | SessionError::AlreadyCompleted
            | SessionError::NotCompleted
            | SessionError::PreviousLevelNotPassed(_) => StatusCode::CONFLICT,
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Expired => StatusCode::GONE,
            SessionError::Unauthorized => StatusCode::FORBIDDEN,
            SessionError::UnknownQuestion(_) | SessionError::InvalidResponse { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        },
        AssessmentServiceError::Repository(
            RepositoryError::Conflict | RepositoryError::ActiveSessionExists,
        ) => StatusCode::CONFLICT,
        AssessmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AssessmentServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AssessmentServiceError::DefinitionLocked(_) => StatusCode::CONFLICT,
        AssessmentServiceError::DefinitionNotFound(_)
        | AssessmentServiceError::ProcedureNotFound(_) => StatusCode::NOT_FOUND,
        AssessmentServiceError::ConditionNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(error: AssessmentServiceError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        error!(error = %error, "assessment request failed");
    }
    let payload = json!({
        "error": error.to_string(),
        "code": error.code(),
    });
    (status, Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, AssessmentServiceError>,
) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn start_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Json(request): Json<StartSessionRequest>,
) -> Response
where
    R: AssessmentStore + 'static,
{
    let candidate_id = match candidate(&headers) {
        Ok(candidate_id) => candidate_id,
        Err(response) => return response,
    };
    let started = service
        .start_session(&candidate_id, &request.test_definition_id)
        .map(|session| session.status_view(session.server_start_time.unwrap_or_default()));
    respond(StatusCode::CREATED, started)
}

pub(crate) async fn answer_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RecordAnswerRequest>,
) -> Response
where
    R: AssessmentStore + 'static,
{
    let candidate_id = match candidate(&headers) {
        Ok(candidate_id) => candidate_id,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.record_answer(
            &candidate_id,
            &SessionId(session_id),
            request.question_id,
            request.response,
        ),
    )
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: AssessmentStore + 'static,
{
    let candidate_id = match candidate(&headers) {
        Ok(candidate_id) => candidate_id,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.complete_session(&candidate_id, &SessionId(session_id)),
    )
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: AssessmentStore + 'static,
{
    let candidate_id = match candidate(&headers) {
        Ok(candidate_id) => candidate_id,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.session_status(&candidate_id, &SessionId(session_id)),
    )
}

pub(crate) async fn result_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: AssessmentStore + 'static,
{
    let candidate_id = match candidate(&headers) {
        Ok(candidate_id) => candidate_id,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.session_result(&candidate_id, &SessionId(session_id)),
    )
}

pub(crate) async fn save_question_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(id): Path<String>,
    Json(draft): Json<QuestionDraft>,
) -> Response
where
    R: AssessmentStore + 'static,
{
    respond(
        StatusCode::OK,
        service.save_question(&TestDefinitionId(id), draft),
    )
}

pub(crate) async fn clone_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: AssessmentStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.clone_definition(&TestDefinitionId(id)),
    )
}

pub(crate) async fn approve_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: AssessmentStore + 'static,
{
    respond(
        StatusCode::OK,
        service.approve_definition(&TestDefinitionId(id)),
    )
}

pub(crate) async fn commission_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Json(request): Json<CommissionRequest>,
) -> Response
where
    R: AssessmentStore + 'static,
{
    let report = service.commission_validity(&request.members);
    (StatusCode::OK, Json(report)).into_response()
}

pub(crate) async fn procedure_commission_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(procedure_id): Path<String>,
) -> Response
where
    R: AssessmentStore + 'static,
{
    respond(
        StatusCode::OK,
        service.procedure_commission_validity(&procedure_id),
    )
}
