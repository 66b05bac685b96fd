//! Model Context Protocol (MCP) connector: transports, client and tool bridge.

pub mod bridge;
pub mod client;
pub mod schema;
pub mod transport;

pub use bridge::McpToolAdapter;
pub use client::McpClient;
pub use schema::{McpToolSchema, ToolDescriptor};
pub use transport::{McpTransport, TransportKind};
