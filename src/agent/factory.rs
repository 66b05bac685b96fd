//! Building agents for a session configuration.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{AgentConfig, AppConfig, ModelConfig};
use crate::error::AgentError;
use crate::mcp::client::McpClient;
use crate::mcp::transport::transport_for;
use crate::mcp::{McpToolAdapter, ToolDescriptor};
use crate::models::OpenAiModel;
use crate::provider::openai::OpenAiProvider;
use crate::session::config::SessionConfig;
use crate::types::GenerationSettings;

use super::agent::{ConversationalAgent, ToolCallingAgent};
use super::prompt::{KustoDefaults, SystemPrompt};

/// A built agent, bound to one configuration and one tool snapshot.
pub struct AgentHandle {
    agent: Arc<dyn ConversationalAgent>,
    tools: Vec<ToolDescriptor>,
    connection: Option<Arc<McpToolAdapter>>,
}

impl AgentHandle {
    pub fn new(agent: Arc<dyn ConversationalAgent>, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            agent,
            tools,
            connection: None,
        }
    }

    /// Attach the MCP connection this agent dispatches tool calls through.
    pub fn with_connection(mut self, connection: Arc<McpToolAdapter>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn agent(&self) -> Arc<dyn ConversationalAgent> {
        Arc::clone(&self.agent)
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Close the tool-server connection. Failures are logged, not returned.
    pub async fn shutdown(self) {
        if let Some(connection) = self.connection {
            if let Err(e) = connection.shutdown().await {
                warn!(error = %e, "MCP connection did not close cleanly");
            }
        }
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("tools", &self.tools)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

/// Builds an [`AgentHandle`] for a validated session configuration.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn build(&self, config: &SessionConfig) -> Result<AgentHandle, AgentError>;
}

/// Production factory: MCP tool server plus OpenAI chat model.
#[derive(Debug, Clone)]
pub struct McpAgentFactory {
    model: ModelConfig,
    agent: AgentConfig,
    kusto: KustoDefaults,
}

impl McpAgentFactory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            agent: config.agent.clone(),
            kusto: config.kusto.clone(),
        }
    }

    fn settings(&self) -> GenerationSettings {
        GenerationSettings::builder()
            .temperature(self.model.temperature)
            .maybe_max_tokens(self.model.max_tokens)
            .build()
    }
}

#[async_trait]
impl AgentFactory for McpAgentFactory {
    async fn build(&self, config: &SessionConfig) -> Result<AgentHandle, AgentError> {
        let model: OpenAiModel = self
            .model
            .name
            .parse()
            .map_err(|_| AgentError::Configuration(format!("unknown model '{}'", self.model.name)))?;
        let provider = OpenAiProvider::new(
            model,
            config.llm_credential.clone(),
            Some(self.model.base_url.clone()),
            self.agent.turn_timeout(),
        )?;
        let prompt = SystemPrompt::render(&self.kusto)?;

        let transport = transport_for(
            config.transport,
            &config.tool_server_url,
            self.agent.connect_timeout(),
        )?;
        let connection = Arc::new(McpToolAdapter::connect(McpClient::new(transport)).await?);
        let descriptors = connection.descriptors();
        let tools = connection.agent_tools();

        info!(
            transport = %config.transport,
            url = %config.tool_server_url,
            tools = tools.len(),
            model = %self.model.name,
            "agent ready"
        );

        let agent = ToolCallingAgent::new(Arc::new(provider), prompt)
            .with_tools(tools)
            .with_settings(self.settings())
            .with_max_tool_iterations(self.agent.max_tool_iterations)
            .with_history_window(self.agent.history_window);

        Ok(AgentHandle::new(Arc::new(agent), descriptors).with_connection(connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::TransportKind;
    use crate::session::conversation::Turn;

    struct Echo;

    #[async_trait]
    impl ConversationalAgent for Echo {
        async fn submit(&self, history: &[Turn]) -> Result<String, AgentError> {
            Ok(history.last().map(|t| t.text.clone()).unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn handle_exposes_agent_and_tools() {
        let handle = AgentHandle::new(
            Arc::new(Echo),
            vec![ToolDescriptor {
                name: "kusto".into(),
                description: "run KQL".into(),
            }],
        );
        assert_eq!(handle.tools()[0].name, "kusto");
        let reply = handle.agent().submit(&[Turn::user("ping")]).await.unwrap();
        assert_eq!(reply, "ping");
        assert!(format!("{handle:?}").contains("connected: false"));
        handle.shutdown().await;
    }

    #[test]
    fn settings_follow_model_config() {
        let mut config = AppConfig::default();
        config.model.max_tokens = Some(512);
        let settings = McpAgentFactory::new(&config).settings();
        assert_eq!(settings.temperature, Some(0.0));
        assert_eq!(settings.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn unreachable_server_fails_with_connection_error() {
        let mut app = AppConfig::default();
        app.agent.connect_timeout_secs = 2;
        let factory = McpAgentFactory::new(&app);
        let config = SessionConfig {
            llm_credential: "sk-test123".into(),
            tool_server_url: "http://127.0.0.1:9/sse".into(),
            transport: TransportKind::Sse,
        };
        let err = factory.build(&config).await.unwrap_err();
        assert!(matches!(err, AgentError::Connection { .. }));
    }
}
