//! JSON bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, FieldError, RecoverySuggestion};
use crate::session::{SessionView, TurnOutcome};

#[derive(Debug, Deserialize)]
pub struct SubmitTurnRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub outcome: TurnOutcome,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub database: String,
    pub sessions: usize,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorCategory,
    pub retryable: bool,
    pub suggestion: RecoverySuggestion,
    pub hint: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}
