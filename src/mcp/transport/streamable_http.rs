use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::ServiceExt;
use rmcp::transport::StreamableHttpClientTransport;
use tracing::debug;

use super::{map_client_initialize_error, McpRunningService, McpTransport, TransportKind};
use crate::error::AgentError;

/// Streamable HTTP transport (single endpoint, JSON or SSE responses).
pub struct StreamableHttpTransport {
    url: String,
}

impl StreamableHttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl McpTransport for StreamableHttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::StreamableHttp
    }

    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn connect(&self, client_info: ClientInfo) -> Result<McpRunningService, AgentError> {
        debug!(url = %self.url, "opening streamable HTTP MCP transport");
        let transport = StreamableHttpClientTransport::from_uri(self.url.clone());
        client_info
            .into_dyn()
            .serve(transport)
            .await
            .map_err(|error| map_client_initialize_error(TransportKind::StreamableHttp, error))
    }
}
