//! Error types for adx-agent.

pub mod unified;
pub mod validation;

pub use unified::{ErrorCategory, RecoverySuggestion};
pub use validation::{FieldError, ValidationErrors};

use thiserror::Error;

/// Primary error type for all adx-agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid configuration: {0}")]
    Validation(ValidationErrors),

    #[error("Connection error ({transport}): {message}")]
    Connection { transport: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("No final answer after {0} tool iterations")]
    IterationLimit(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("A request is already in progress for this session")]
    Busy,

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl AgentError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a connection error for the given transport.
    pub fn connection(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::InvalidArgument(_) => ErrorCategory::Validation,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::ToolExecution { .. } | Self::IterationLimit(_) => ErrorCategory::ToolExecution,
            Self::Provider { .. } => ErrorCategory::Api,
            Self::InvalidState(_) | Self::Busy | Self::SessionNotFound(_) => ErrorCategory::State,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether a deliberate user retry is likely to succeed.
    ///
    /// Nothing in the crate retries automatically; this only labels errors for display.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
                | ErrorCategory::Connection
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server => {
                RecoverySuggestion::RetryLater
            }
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Connection => RecoverySuggestion::CheckServerEndpoint,
            ErrorCategory::Validation | ErrorCategory::Configuration => {
                RecoverySuggestion::CheckConfiguration
            }
            ErrorCategory::ToolExecution => RecoverySuggestion::RephraseQuestion,
            _ => RecoverySuggestion::ResetSession,
        }
    }
}

impl From<ValidationErrors> for AgentError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentError>;
