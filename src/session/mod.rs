//! Session-scoped state: configuration, agent handle and conversation log.
//!
//! Every browser tab owns one [`Session`]. Handlers never touch ambient state; they go
//! through the [`SessionController`], which serializes turns per session.

pub mod config;
pub mod controller;
pub mod conversation;
pub mod store;

pub use config::{ConfigDraft, ServerDetails, SessionConfig};
pub use controller::{CommitOutcome, SessionController};
pub use conversation::{ConversationLog, Turn, TurnRole};
pub use store::{SessionId, SessionStore};

use serde::Serialize;
use strum::Display;
use tokio::time::Instant;

use crate::agent::AgentHandle;
use crate::error::{AgentError, ErrorCategory, RecoverySuggestion};
use crate::mcp::ToolDescriptor;

use conversation::TURN_ERROR_PREFIX;

/// Where the session is in its connection lifecycle.
#[derive(Debug, Default)]
pub enum ConnectionPhase {
    /// Configuration incomplete.
    #[default]
    Unconfigured,
    /// Configuration committed, no agent built yet.
    Ready,
    Connecting,
    Connected(AgentHandle),
    Failed {
        message: String,
        suggestion: RecoverySuggestion,
    },
}

impl ConnectionPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Unconfigured => PhaseKind::Unconfigured,
            Self::Ready => PhaseKind::Ready,
            Self::Connecting => PhaseKind::Connecting,
            Self::Connected(_) => PhaseKind::Connected,
            Self::Failed { .. } => PhaseKind::Failed,
        }
    }

    /// Move out any live agent handle, leaving `next` in its place.
    fn replace(&mut self, next: ConnectionPhase) -> Option<AgentHandle> {
        match std::mem::replace(self, next) {
            Self::Connected(handle) => Some(handle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhaseKind {
    Unconfigured,
    Ready,
    Connecting,
    Connected,
    Failed,
}

/// Result of processing one user turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Reply { text: String },
    Failed { kind: ErrorCategory, message: String },
}

impl TurnOutcome {
    pub fn from_result(result: Result<String, AgentError>) -> Self {
        match result {
            Ok(text) => Self::Reply { text },
            Err(e) => Self::Failed {
                kind: e.category(),
                message: e.to_string(),
            },
        }
    }

    /// The assistant turn recorded in the log for this outcome.
    pub fn to_turn(&self) -> Turn {
        match self {
            Self::Reply { text } => Turn::assistant(text.clone()),
            Self::Failed { message, .. } => Turn::assistant(format!("{TURN_ERROR_PREFIX}{message}")),
        }
    }
}

/// One user's state.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    config: Option<SessionConfig>,
    phase: ConnectionPhase,
    log: ConversationLog,
    busy: bool,
    /// Bumped by reset; results computed under an older epoch are dropped.
    epoch: u64,
    last_active: Instant,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            config: None,
            phase: ConnectionPhase::Unconfigured,
            log: ConversationLog::new(),
            busy: false,
            epoch: 0,
            last_active: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn phase(&self) -> &ConnectionPhase {
        &self.phase
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_active(&self) -> Instant {
        self.last_active
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Whether another action must wait for the in-flight one.
    fn is_occupied(&self) -> bool {
        self.busy || matches!(self.phase, ConnectionPhase::Connecting)
    }

    /// Clear every field and dependent state in one step.
    fn reset(&mut self) -> Option<AgentHandle> {
        self.config = None;
        self.log.clear();
        self.busy = false;
        self.epoch += 1;
        self.touch();
        self.phase.replace(ConnectionPhase::Unconfigured)
    }

    pub fn view(&self) -> SessionView {
        let (tools, failure, suggestion) = match &self.phase {
            ConnectionPhase::Connected(handle) => (handle.tools().to_vec(), None, None),
            ConnectionPhase::Failed {
                message,
                suggestion,
            } => (Vec::new(), Some(message.clone()), Some(*suggestion)),
            _ => (Vec::new(), None, None),
        };
        SessionView {
            id: self.id,
            configured: self.config.is_some(),
            phase: self.phase.kind(),
            failure,
            suggestion,
            hint: suggestion.map(RecoverySuggestion::hint),
            server: self.config.as_ref().map(ServerDetails::from),
            tools,
            transcript: self.log.turns().to_vec(),
            busy: self.busy,
        }
    }
}

/// Read-only snapshot used for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: SessionId,
    /// A validated configuration is committed.
    pub configured: bool,
    pub phase: PhaseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<RecoverySuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    pub server: Option<ServerDetails>,
    pub tools: Vec<ToolDescriptor>,
    pub transcript: Vec<Turn>,
    pub busy: bool,
}
