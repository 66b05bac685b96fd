//! Bridge MCP tools into the agent's tool system.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{Tool, ToolExecutionContext};

use super::client::{McpClient, McpToolCallResult};
use super::schema::{McpToolSchema, ToolDescriptor};

#[async_trait]
trait McpClientOps: Send {
    async fn initialize(&mut self) -> Result<(), AgentError>;
    async fn list_tools(&mut self) -> Result<Vec<McpToolSchema>, AgentError>;
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<McpToolCallResult, AgentError>;
    async fn close(&mut self) -> Result<(), AgentError>;
}

#[async_trait]
impl McpClientOps for McpClient {
    async fn initialize(&mut self) -> Result<(), AgentError> {
        McpClient::initialize(self).await
    }

    async fn list_tools(&mut self) -> Result<Vec<McpToolSchema>, AgentError> {
        McpClient::list_tools(self).await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<McpToolCallResult, AgentError> {
        McpClient::call_tool(self, name, arguments).await
    }

    async fn close(&mut self) -> Result<(), AgentError> {
        McpClient::close(self).await
    }
}

/// A connected MCP session and the tools it offered.
///
/// The tool list is fetched once, when the adapter connects, and served from that
/// snapshot for the lifetime of the connection.
pub struct McpToolAdapter {
    client: Mutex<Box<dyn McpClientOps>>,
    tools: Vec<McpToolSchema>,
}

impl McpToolAdapter {
    /// Initialize `client` and capture the server's tool list.
    pub async fn connect(client: McpClient) -> Result<Self, AgentError> {
        Self::connect_ops(Box::new(client)).await
    }

    async fn connect_ops(mut client: Box<dyn McpClientOps>) -> Result<Self, AgentError> {
        client.initialize().await?;
        let tools = match client.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                let _ = client.close().await;
                return Err(e);
            }
        };
        info!(count = tools.len(), "MCP tools discovered");
        Ok(Self {
            client: Mutex::new(client),
            tools,
        })
    }

    /// Name and description of each discovered tool, in server order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(ToolDescriptor::from).collect()
    }

    /// Close the underlying MCP session.
    pub async fn shutdown(&self) -> Result<(), AgentError> {
        self.client.lock().await.close().await
    }
}

impl McpToolAdapter {
    /// One agent tool per discovered MCP tool, all sharing this session.
    pub fn agent_tools(self: &Arc<Self>) -> Vec<Arc<dyn Tool>> {
        self.tools
            .iter()
            .map(|schema| {
                Arc::new(McpTool {
                    connection: Arc::clone(self),
                    description: schema.description.clone().unwrap_or_default(),
                    schema: schema.clone(),
                }) as Arc<dyn Tool>
            })
            .collect()
    }

    async fn call(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, AgentError> {
        debug!(tool = name, call_id = ?ctx.call_id, "calling MCP tool");
        let mut client = self.client.lock().await;
        let result = client.call_tool(name, args.raw().clone()).await?;
        Ok(result.into_value_or_text())
    }
}

/// A single remote tool, invoked through its owning session.
struct McpTool {
    connection: Arc<McpToolAdapter>,
    description: String,
    schema: McpToolSchema,
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> &serde_json::Value {
        &self.schema.input_schema
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, AgentError> {
        self.connection.call(&self.schema.name, args, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockClientOps {
        initialize_error: Option<String>,
        list_tools_result: Result<Vec<McpToolSchema>, String>,
        call_tool_results: VecDeque<Result<McpToolCallResult, AgentError>>,
        list_calls: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    impl MockClientOps {
        fn with_tools(tools: Vec<McpToolSchema>) -> Self {
            Self {
                initialize_error: None,
                list_tools_result: Ok(tools),
                call_tool_results: VecDeque::new(),
                list_calls: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl McpClientOps for MockClientOps {
        async fn initialize(&mut self) -> Result<(), AgentError> {
            match &self.initialize_error {
                Some(message) => Err(AgentError::connection("sse", message.clone())),
                None => Ok(()),
            }
        }

        async fn list_tools(&mut self) -> Result<Vec<McpToolSchema>, AgentError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            match &self.list_tools_result {
                Ok(tools) => Ok(tools.clone()),
                Err(message) => Err(AgentError::Provider {
                    provider: "mcp".into(),
                    message: message.clone(),
                }),
            }
        }

        async fn call_tool(
            &mut self,
            _name: &str,
            _arguments: serde_json::Value,
        ) -> Result<McpToolCallResult, AgentError> {
            self.call_tool_results.pop_front().unwrap_or_else(|| {
                Err(AgentError::InvalidState("missing mock call_tool result".into()))
            })
        }

        async fn close(&mut self) -> Result<(), AgentError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn kusto_schema(description: Option<&str>) -> McpToolSchema {
        McpToolSchema {
            name: "kusto".into(),
            description: description.map(str::to_string),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string" },
                    "parameters": { "type": "object" }
                }
            }),
        }
    }

    #[tokio::test]
    async fn agent_tools_preserve_schema() {
        let ops = MockClientOps::with_tools(vec![kusto_schema(Some("Azure Data Explorer"))]);
        let adapter = Arc::new(McpToolAdapter::connect_ops(Box::new(ops)).await.unwrap());
        let tools = adapter.agent_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name(), "kusto");
        assert_eq!(tools[0].description(), "Azure Data Explorer");
        assert_eq!(tools[0].input_schema()["type"], "object");
    }

    #[tokio::test]
    async fn connect_captures_tools_once() {
        let ops = MockClientOps::with_tools(vec![kusto_schema(None)]);
        let list_calls = Arc::clone(&ops.list_calls);
        let adapter = Arc::new(McpToolAdapter::connect_ops(Box::new(ops)).await.unwrap());

        assert_eq!(adapter.agent_tools().len(), 1);
        assert_eq!(adapter.agent_tools().len(), 1);
        assert_eq!(list_calls.load(Ordering::SeqCst), 1);

        let descriptors = adapter.descriptors();
        assert_eq!(descriptors[0].name, "kusto");
        assert_eq!(descriptors[0].description, "No description");
    }

    #[tokio::test]
    async fn connect_surfaces_initialize_failure() {
        let mut ops = MockClientOps::with_tools(Vec::new());
        ops.initialize_error = Some("handshake refused".into());
        let err = McpToolAdapter::connect_ops(Box::new(ops))
            .await
            .err()
            .expect("initialize failure should abort connect");
        assert!(matches!(err, AgentError::Connection { message, .. } if message == "handshake refused"));
    }

    #[tokio::test]
    async fn failed_listing_closes_client() {
        let mut ops = MockClientOps::with_tools(Vec::new());
        ops.list_tools_result = Err("tools/list not supported".into());
        let closed = Arc::clone(&ops.closed);
        assert!(McpToolAdapter::connect_ops(Box::new(ops)).await.is_err());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_tool_returns_text_result() {
        let mut ops = MockClientOps::with_tools(vec![kusto_schema(Some("run KQL"))]);
        ops.call_tool_results.push_back(Ok(McpToolCallResult {
            structured_content: None,
            text_content: Some("IncidentId | Title".into()),
            content: Vec::new(),
        }));
        let adapter = Arc::new(McpToolAdapter::connect_ops(Box::new(ops)).await.unwrap());

        let value = adapter.agent_tools()[0]
            .execute(
                &ToolArguments::new(json!({"command": "kusto_query"})),
                &ToolExecutionContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(value, json!("IncidentId | Title"));
    }

    #[tokio::test]
    async fn execute_tool_propagates_tool_error_without_panic() {
        let mut ops = MockClientOps::with_tools(Vec::new());
        ops.call_tool_results
            .push_back(Err(AgentError::ToolExecution {
                tool_name: "kusto".into(),
                message: "downstream tool failure".into(),
            }));
        let adapter = McpToolAdapter::connect_ops(Box::new(ops)).await.unwrap();

        let err = adapter
            .call(
                "kusto",
                &ToolArguments::new(json!({})),
                &ToolExecutionContext::default(),
            )
            .await
            .expect_err("tool errors should be propagated");

        assert!(matches!(
            err,
            AgentError::ToolExecution { tool_name, message }
            if tool_name == "kusto" && message.contains("downstream tool failure")
        ));
    }

    #[tokio::test]
    async fn shutdown_closes_client() {
        let ops = MockClientOps::with_tools(Vec::new());
        let closed = Arc::clone(&ops.closed);
        let adapter = McpToolAdapter::connect_ops(Box::new(ops)).await.unwrap();
        adapter.shutdown().await.unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
