use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest_eventsource::{Event, EventSource};
use rmcp::model::{ClientInfo, ClientJsonRpcMessage, ServerJsonRpcMessage};
use rmcp::service::{RoleClient, ServiceExt};
use rmcp::transport::Transport;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::{map_client_initialize_error, McpRunningService, McpTransport, TransportKind};
use crate::error::AgentError;

const ENDPOINT_EVENT: &str = "endpoint";
const MESSAGE_EVENT: &str = "message";
const INBOUND_BUFFER: usize = 64;

/// Errors raised while talking to a legacy HTTP+SSE MCP server.
#[derive(Debug, Error)]
pub enum SseTransportError {
    #[error("POST to message endpoint failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("message endpoint rejected request (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Legacy HTTP+SSE transport.
///
/// The client opens an event stream on `url`; the server's first `endpoint` event names
/// the URL that JSON-RPC requests are POSTed to, and responses arrive as `message`
/// events on the stream.
pub struct SseTransport {
    url: String,
    connect_timeout: Duration,
    client: reqwest::Client,
}

impl SseTransport {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self, AgentError> {
        // No overall timeout: the event stream stays open for the whole session.
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            connect_timeout,
            client,
        })
    }

    async fn open_session(&self) -> Result<SseSession, AgentError> {
        let base = Url::parse(&self.url)
            .map_err(|e| AgentError::connection(TransportKind::Sse.to_string(), e.to_string()))?;

        let request = self
            .client
            .get(base.clone())
            .header(ACCEPT, "text/event-stream");
        let mut events = EventSource::new(request)
            .map_err(|e| AgentError::connection(TransportKind::Sse.to_string(), e.to_string()))?;
        events.set_retry_policy(Box::new(reqwest_eventsource::retry::Never));

        let announced =
            tokio::time::timeout(self.connect_timeout, wait_for_endpoint(&mut events)).await;
        let endpoint = match announced {
            Ok(result) => result?,
            Err(_) => {
                events.close();
                return Err(AgentError::connection(
                    TransportKind::Sse.to_string(),
                    format!(
                        "server sent no '{ENDPOINT_EVENT}' event within {}s",
                        self.connect_timeout.as_secs()
                    ),
                ));
            }
        };

        let post_url = base.join(endpoint.trim()).map_err(|e| {
            AgentError::connection(
                TransportKind::Sse.to_string(),
                format!("invalid message endpoint '{endpoint}': {e}"),
            )
        })?;
        debug!(stream = %base, endpoint = %post_url, "SSE MCP endpoint announced");

        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        let cancel = CancellationToken::new();
        tokio::spawn(pump_messages(events, tx, cancel.clone()));

        Ok(SseSession {
            client: self.client.clone(),
            post_url: Arc::new(post_url),
            request_timeout: self.connect_timeout,
            inbound: rx,
            cancel,
        })
    }
}

#[async_trait]
impl McpTransport for SseTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Sse
    }

    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn connect(&self, client_info: ClientInfo) -> Result<McpRunningService, AgentError> {
        let session = self.open_session().await?;
        client_info
            .into_dyn()
            .serve(session)
            .await
            .map_err(|error| map_client_initialize_error(TransportKind::Sse, error))
    }
}

async fn wait_for_endpoint(events: &mut EventSource) -> Result<String, AgentError> {
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Open) => continue,
            Ok(Event::Message(message)) if message.event == ENDPOINT_EVENT => {
                return Ok(message.data);
            }
            Ok(Event::Message(message)) => {
                debug!(event = %message.event, "ignoring SSE event before endpoint");
            }
            Err(e) => {
                events.close();
                return Err(AgentError::connection(
                    TransportKind::Sse.to_string(),
                    e.to_string(),
                ));
            }
        }
    }
    Err(AgentError::connection(
        TransportKind::Sse.to_string(),
        "event stream ended before the endpoint was announced",
    ))
}

async fn pump_messages(
    mut events: EventSource,
    tx: mpsc::Sender<ServerJsonRpcMessage>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.next() => event,
        };
        match event {
            Some(Ok(Event::Message(message)))
                if message.event == MESSAGE_EVENT || message.event.is_empty() =>
            {
                match serde_json::from_str::<ServerJsonRpcMessage>(&message.data) {
                    Ok(parsed) => {
                        if tx.send(parsed).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "dropping unparseable MCP message"),
                }
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "SSE MCP stream failed");
                break;
            }
            None => break,
        }
    }
    events.close();
}

/// A connected SSE session, driven by rmcp.
struct SseSession {
    client: reqwest::Client,
    post_url: Arc<Url>,
    request_timeout: Duration,
    inbound: mpsc::Receiver<ServerJsonRpcMessage>,
    cancel: CancellationToken,
}

impl Transport<RoleClient> for SseSession {
    type Error = SseTransportError;

    fn send(
        &mut self,
        item: ClientJsonRpcMessage,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let client = self.client.clone();
        let url = Arc::clone(&self.post_url);
        let timeout = self.request_timeout;
        async move {
            let resp = client
                .post(url.as_str())
                .timeout(timeout)
                .json(&item)
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(SseTransportError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(())
        }
    }

    fn receive(&mut self) -> impl Future<Output = Option<ServerJsonRpcMessage>> + Send {
        self.inbound.recv()
    }

    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.cancel.cancel();
        self.inbound.close();
        std::future::ready(Ok(()))
    }
}

impl Drop for SseSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let transport =
            SseTransport::new("http://127.0.0.1:9/sse", Duration::from_secs(2)).unwrap();
        let err = transport
            .open_session()
            .await
            .err()
            .expect("nothing listens on the discard port");
        assert!(matches!(err, AgentError::Connection { transport, .. } if transport == "sse"));
    }

    #[test]
    fn relative_endpoint_resolves_against_stream_url() {
        let base = Url::parse("https://example.com/sse").unwrap();
        let joined = base.join("/messages?sessionId=abc").unwrap();
        assert_eq!(joined.as_str(), "https://example.com/messages?sessionId=abc");
    }
}
