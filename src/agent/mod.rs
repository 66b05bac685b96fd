//! Conversational agent: system prompt, tool-calling loop and per-session handles.

pub mod agent;
pub mod factory;
pub mod prompt;

pub use agent::{ConversationalAgent, ToolCallingAgent};
pub use factory::{AgentFactory, AgentHandle, McpAgentFactory};
pub use prompt::{KustoDefaults, KustoQueryCall, SystemPrompt};
