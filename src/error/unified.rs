//! Error classification and recovery.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad error category, carried by failed turns and API error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Connection,
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    ToolExecution,
    State,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySuggestion {
    RetryLater,
    CheckCredentials,
    CheckConfiguration,
    CheckServerEndpoint,
    IncreaseTimeout,
    RephraseQuestion,
    ResetSession,
}

impl RecoverySuggestion {
    /// One-line advice shown next to the error.
    pub fn hint(self) -> &'static str {
        match self {
            Self::RetryLater => "The service is temporarily unavailable. Wait a moment and try again.",
            Self::CheckCredentials => "Verify that your OpenAI API key is correct and active.",
            Self::CheckConfiguration => "Correct the highlighted configuration values and submit again.",
            Self::CheckServerEndpoint => {
                "Make sure the MCP server is running and reachable at this URL. SSE endpoints \
                 usually end with /sse; switch the transport if the server expects the other one."
            }
            Self::IncreaseTimeout => {
                "The request did not finish in time. Retry, or raise the timeout in the service configuration."
            }
            Self::RephraseQuestion => "A tool call failed. Try rephrasing the question.",
            Self::ResetSession => "Reset the session and configure it again.",
        }
    }
}
