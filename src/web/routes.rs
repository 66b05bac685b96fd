//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::error::AgentError;
use crate::session::{CommitOutcome, ConfigDraft, SessionId, SessionView};

use super::dto::{ErrorBody, HealthResponse, SubmitTurnRequest, TurnResponse};
use super::page::INDEX_HTML;
use super::server::AppState;

/// [`AgentError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AgentError);

impl From<AgentError> for ApiError {
    fn from(error: AgentError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AgentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AgentError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AgentError::Connection { .. } => StatusCode::BAD_GATEWAY,
            AgentError::Busy | AgentError::InvalidState(_) => StatusCode::CONFLICT,
            AgentError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AgentError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let suggestion = self.0.recovery_suggestion();
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.category(),
            retryable: self.0.is_retryable(),
            suggestion,
            hint: suggestion.hint(),
            fields: match &self.0 {
                AgentError::Validation(errors) => Some(errors.errors().to_vec()),
                _ => None,
            },
        };
        debug!(%status, error = %body.error, "request failed");
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.model.name.clone(),
        database: state.config.kusto.database.clone(),
        sessions: state.controller.store().len(),
    })
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(state.controller.create().await))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> ApiResult<SessionView> {
    Ok(Json(state.controller.view(id).await?))
}

pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.controller.end(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn commit_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(draft): Json<ConfigDraft>,
) -> ApiResult<CommitOutcome> {
    Ok(Json(state.controller.commit_config(id, draft).await?))
}

pub async fn connect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> ApiResult<SessionView> {
    Ok(Json(state.controller.connect(id).await?))
}

pub async fn submit_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<SubmitTurnRequest>,
) -> ApiResult<TurnResponse> {
    let outcome = state.controller.submit_turn(id, &request.message).await?;
    let session = state.controller.view(id).await?;
    Ok(Json(TurnResponse { outcome, session }))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> ApiResult<SessionView> {
    Ok(Json(state.controller.reset(id).await?))
}

pub async fn clear_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> ApiResult<SessionView> {
    Ok(Json(state.controller.clear_transcript(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrors;

    #[test]
    fn errors_map_to_status_codes() {
        let mut fields = ValidationErrors::default();
        fields.push("tool_server_url", "bad");
        let cases = [
            (AgentError::Validation(fields), StatusCode::UNPROCESSABLE_ENTITY),
            (AgentError::connection("sse", "refused"), StatusCode::BAD_GATEWAY),
            (AgentError::Busy, StatusCode::CONFLICT),
            (AgentError::SessionNotFound("x".into()), StatusCode::NOT_FOUND),
            (AgentError::Timeout(30_000), StatusCode::GATEWAY_TIMEOUT),
            (AgentError::api(401, "nope"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError(error).into_response().status(), expected);
        }
    }
}
