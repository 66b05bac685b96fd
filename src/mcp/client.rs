//! MCP client for connecting to a tool server.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, Content, JsonObject, ProtocolVersion,
    ResourceContents,
};
use rmcp::service::ServiceError;
use tracing::{debug, info};

use super::schema::McpToolSchema;
use super::transport::{McpRunningService, McpTransport, TransportKind};
use crate::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpConnectionState {
    Disconnected,
    Initialized,
    Closed,
}

#[derive(Debug, Clone)]
pub struct McpToolCallResult {
    pub structured_content: Option<serde_json::Value>,
    pub text_content: Option<String>,
    pub content: Vec<serde_json::Value>,
}

impl McpToolCallResult {
    pub fn into_value_or_text(self) -> serde_json::Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        if let Some(text) = self.text_content {
            return serde_json::Value::String(text);
        }
        serde_json::Value::Array(self.content)
    }
}

/// Client for a Model Context Protocol server.
pub struct McpClient {
    transport: Box<dyn McpTransport>,
    session: Option<McpRunningService>,
    state: McpConnectionState,
}

impl McpClient {
    /// Create a new MCP client with the given transport.
    pub fn new(transport: Box<dyn McpTransport>) -> Self {
        Self {
            transport,
            session: None,
            state: McpConnectionState::Disconnected,
        }
    }

    pub fn connection_state(&self) -> McpConnectionState {
        self.state
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Open the transport and complete the initialize handshake.
    ///
    /// Idempotent while the session is alive. A closed client cannot be reopened.
    pub async fn initialize(&mut self) -> Result<(), AgentError> {
        match self.state {
            McpConnectionState::Initialized => return Ok(()),
            McpConnectionState::Closed => return Err(self.closed_error()),
            McpConnectionState::Disconnected => {}
        }

        let client_info = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };
        let session = self.transport.connect(client_info).await?;
        if let Some(server) = session.peer_info() {
            info!(
                transport = %self.transport.kind(),
                url = self.transport.endpoint(),
                server = %server.server_info.name,
                "MCP session initialized"
            );
        }
        self.session = Some(session);
        self.state = McpConnectionState::Initialized;
        Ok(())
    }

    /// List every tool the server advertises, following pagination.
    pub async fn list_tools(&mut self) -> Result<Vec<McpToolSchema>, AgentError> {
        let kind = self.transport.kind();
        let session = self.active_session()?;

        let tools = match session.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => {
                let page = session
                    .list_tools(None)
                    .await
                    .map_err(|e| map_service_error(kind, "list_tools", e))?;
                page.tools
            }
            Err(e) => return Err(map_service_error(kind, "list_tools", e)),
        };

        debug!(count = tools.len(), "MCP tools listed");
        Ok(tools.into_iter().map(map_mcp_tool_schema).collect())
    }

    /// Execute a tool on the MCP server.
    ///
    /// Arguments are forwarded as-is; string values (KQL text included) are not escaped
    /// or rewritten.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<McpToolCallResult, AgentError> {
        let kind = self.transport.kind();
        let session = self.active_session()?;
        let arguments = coerce_tool_arguments(arguments)?;

        let result = session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_service_error(kind, "call_tool", e))?;

        map_call_result(name, result)
    }

    /// Tear the session down. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), AgentError> {
        self.state = McpConnectionState::Closed;
        if let Some(session) = self.session.take() {
            session.cancel().await.map_err(|e| {
                AgentError::connection(self.transport.kind().to_string(), e.to_string())
            })?;
            debug!(url = self.transport.endpoint(), "MCP session closed");
        }
        Ok(())
    }

    fn active_session(&self) -> Result<&McpRunningService, AgentError> {
        match (self.state, self.session.as_ref()) {
            (McpConnectionState::Initialized, Some(session)) if !session.is_closed() => {
                Ok(session)
            }
            (McpConnectionState::Initialized, Some(_)) | (McpConnectionState::Closed, _) => {
                Err(self.closed_error())
            }
            _ => Err(AgentError::InvalidState(
                "MCP client must be initialized first".into(),
            )),
        }
    }

    fn closed_error(&self) -> AgentError {
        AgentError::connection(self.transport.kind().to_string(), "MCP session is closed")
    }
}

fn map_mcp_tool_schema(tool: rmcp::model::Tool) -> McpToolSchema {
    McpToolSchema {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>, AgentError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                AgentError::InvalidArgument(format!("MCP tool arguments must be valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(AgentError::InvalidArgument(format!(
            "MCP tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn extract_text_content(content: &[Content]) -> Option<String> {
    let mut lines = Vec::new();
    for item in content {
        if let Some(text) = item.as_text() {
            lines.push(text.text.clone());
            continue;
        }
        if let Some(resource) = item.as_resource() {
            if let ResourceContents::TextResourceContents { text, .. } = &resource.resource {
                lines.push(text.clone());
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<McpToolCallResult, AgentError> {
    let text_content = extract_text_content(&result.content);
    let content = result
        .content
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect::<Vec<_>>();

    if result.is_error.unwrap_or(false) {
        let message = result
            .structured_content
            .as_ref()
            .map(|v| v.to_string())
            .or_else(|| text_content.clone())
            .unwrap_or_else(|| "MCP tool returned an error result".into());

        return Err(AgentError::ToolExecution {
            tool_name: name.to_string(),
            message,
        });
    }

    Ok(McpToolCallResult {
        structured_content: result.structured_content,
        text_content,
        content,
    })
}

fn map_service_error(kind: TransportKind, context: &str, error: ServiceError) -> AgentError {
    match error {
        ServiceError::McpError(error) => AgentError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP error {}: {}", error.code.0, error.message),
        },
        ServiceError::TransportSend(error) => AgentError::connection(
            kind.to_string(),
            format!("{context}: transport send failed: {error}"),
        ),
        ServiceError::TransportClosed => {
            AgentError::connection(kind.to_string(), format!("{context}: transport closed"))
        }
        ServiceError::UnexpectedResponse => AgentError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: unexpected MCP response"),
        },
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            AgentError::connection(
                kind.to_string(),
                format!("{context}: request cancelled{suffix}"),
            )
        }
        ServiceError::Timeout { timeout } => AgentError::Timeout(timeout.as_millis() as u64),
        other => AgentError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP service error: {other}"),
        },
    }
}
