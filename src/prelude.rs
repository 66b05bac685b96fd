//! Convenience re-exports for common use.

pub use crate::agent::{AgentFactory, AgentHandle, ConversationalAgent, SystemPrompt};
pub use crate::config::AppConfig;
pub use crate::error::{AgentError, ErrorCategory, Result};
pub use crate::mcp::{McpClient, ToolDescriptor, TransportKind};
pub use crate::provider::ModelProvider;
pub use crate::session::{ConfigDraft, SessionController, SessionView, Turn, TurnOutcome};
pub use crate::tools::{Tool, ToolArguments, ToolExecutionContext};
pub use crate::types::{GenerationSettings, ModelMessage, Role};
