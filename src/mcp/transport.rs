//! MCP transport layer.

use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::AgentError;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// Wire mechanism used to reach the tool server.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransportKind {
    /// Long-lived event stream plus a POST endpoint announced by the server.
    #[default]
    Sse,
    /// Request/response over a single endpoint, optionally streamed.
    StreamableHttp,
}

impl TransportKind {
    /// Human description shown next to the transport selector.
    pub fn description(self) -> &'static str {
        match self {
            Self::Sse => {
                "SSE (Server-Sent Events): best for HTTP servers that stream responses. \
                 Common for cloud-hosted MCP servers."
            }
            Self::StreamableHttp => {
                "Streamable HTTP: for servers using the newer HTTP streaming transport protocol."
            }
        }
    }
}

/// Transport trait for MCP communication.
#[async_trait]
pub trait McpTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Endpoint this transport connects to.
    fn endpoint(&self) -> &str;

    /// Open the connection and run the MCP initialize handshake.
    async fn connect(&self, client_info: ClientInfo) -> Result<McpRunningService, AgentError>;
}

mod sse;
mod streamable_http;

pub use sse::{SseTransport, SseTransportError};
pub use streamable_http::StreamableHttpTransport;

/// Build the transport for `kind` pointed at `url`.
pub fn transport_for(
    kind: TransportKind,
    url: &str,
    connect_timeout: Duration,
) -> Result<Box<dyn McpTransport>, AgentError> {
    Ok(match kind {
        TransportKind::Sse => Box::new(SseTransport::new(url, connect_timeout)?),
        TransportKind::StreamableHttp => Box::new(StreamableHttpTransport::new(url)),
    })
}

pub(crate) fn map_client_initialize_error(
    kind: TransportKind,
    error: ClientInitializeError,
) -> AgentError {
    let message = match error {
        ClientInitializeError::ConnectionClosed(context) => {
            format!("connection closed during initialize: {context}")
        }
        ClientInitializeError::TransportError { error, context } => {
            format!("transport error ({context}): {error}")
        }
        ClientInitializeError::JsonRpcError(error) => format!(
            "initialize rejected with JSON-RPC error {}: {}",
            error.code.0, error.message
        ),
        ClientInitializeError::Cancelled => "initialize cancelled".to_string(),
        other => format!("initialize failed: {other}"),
    };
    AgentError::connection(kind.to_string(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn transport_kind_uses_snake_case_names() {
        assert_eq!(TransportKind::Sse.to_string(), "sse");
        assert_eq!(TransportKind::StreamableHttp.to_string(), "streamable_http");
        assert_eq!(
            "streamable_http".parse::<TransportKind>().unwrap(),
            TransportKind::StreamableHttp
        );
        assert!("stdio".parse::<TransportKind>().is_err());
        assert_eq!(
            serde_json::to_value(TransportKind::StreamableHttp).unwrap(),
            "streamable_http"
        );
        assert_eq!(TransportKind::iter().count(), 2);
    }

    #[test]
    fn jsonrpc_initialize_error_maps_to_connection_error() {
        let init_error = ClientInitializeError::JsonRpcError(
            rmcp::model::ErrorData::invalid_request("bad initialize payload", None),
        );
        let err = map_client_initialize_error(TransportKind::Sse, init_error);
        assert!(matches!(
            err,
            AgentError::Connection { transport, message }
            if transport == "sse" && message.contains("bad initialize payload")
        ));
    }

    #[test]
    fn transport_for_builds_requested_kind() {
        let sse = transport_for(
            TransportKind::Sse,
            "https://example.com/sse",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(sse.kind(), TransportKind::Sse);
        assert_eq!(sse.endpoint(), "https://example.com/sse");

        let http = transport_for(
            TransportKind::StreamableHttp,
            "https://example.com/mcp",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(http.kind(), TransportKind::StreamableHttp);
    }
}
