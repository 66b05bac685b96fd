//! Conversational agent: replays a transcript through the model and its tools.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::generation::generate_text;
use crate::provider::ModelProvider;
use crate::session::conversation::{windowed, Turn};
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::Tool;
use crate::types::*;

use super::prompt::{KustoQueryArgs, SystemPrompt};

/// Default cap on model calls within one turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 25;

/// Narrow interface the session layer talks to.
#[async_trait]
pub trait ConversationalAgent: Send + Sync {
    /// Answer the last user turn given the full ordered history.
    async fn submit(&self, history: &[Turn]) -> Result<String, AgentError>;
}

/// Agent that binds a model, a tool set and a fixed system prompt.
pub struct ToolCallingAgent {
    provider: Arc<dyn ModelProvider>,
    system_prompt: SystemPrompt,
    tools: Vec<Arc<dyn Tool>>,
    settings: GenerationSettings,
    max_tool_iterations: usize,
    history_window: Option<usize>,
}

impl ToolCallingAgent {
    pub fn new(provider: Arc<dyn ModelProvider>, system_prompt: SystemPrompt) -> Self {
        Self {
            provider,
            system_prompt,
            tools: Vec::new(),
            settings: GenerationSettings::deterministic(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            history_window: None,
        }
    }

    /// Add tools.
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Set generation settings.
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Replay only the most recent `window` turns. `None` replays everything.
    pub fn with_history_window(mut self, window: Option<usize>) -> Self {
        self.history_window = window;
        self
    }

    fn build_messages(&self, history: &[Turn]) -> Vec<ModelMessage> {
        let replayed = windowed(history, self.history_window);
        let mut messages = Vec::with_capacity(replayed.len() + 1);
        messages.push(ModelMessage::system(self.system_prompt.as_str()));
        messages.extend(replayed.iter().map(Turn::to_model_message));
        messages
    }
}

#[async_trait]
impl ConversationalAgent for ToolCallingAgent {
    async fn submit(&self, history: &[Turn]) -> Result<String, AgentError> {
        if history.is_empty() {
            return Err(AgentError::InvalidArgument(
                "conversation history is empty".into(),
            ));
        }

        let messages = self.build_messages(history);
        debug!(
            turns = history.len(),
            replayed = messages.len() - 1,
            model = self.provider.model_id(),
            "submitting conversation"
        );

        let result = generate_text(
            self.provider.as_ref(),
            messages,
            &self.settings,
            &self.tools,
            self.max_tool_iterations,
        )
        .await?;

        for call in result.steps.iter().flat_map(|step| &step.tool_calls) {
            log_query(call);
        }
        info!(
            steps = result.steps.len(),
            tokens = result.usage.total_tokens,
            "turn answered"
        );
        Ok(result.text)
    }
}

fn log_query(call: &AgentToolCall) {
    match ToolArguments::new(call.arguments.clone()).deserialize::<KustoQueryArgs>() {
        Ok(args) => debug!(
            tool = %call.name,
            database = %args.parameters.database,
            query = %args.parameters.query,
            "KQL tool call"
        ),
        Err(_) => debug!(tool = %call.name, "tool call"),
    }
}
