//! adx-agent: a chat service that answers questions about Azure incident data.
//!
//! A user supplies an OpenAI API key and the URL of a Model Context Protocol (MCP)
//! tool server. The service connects to that server, wraps its tools in a
//! tool-calling agent primed with a fixed KQL instruction prompt, and replays the
//! session's conversation through the agent on every turn.
//!
//! ```no_run
//! use adx_agent::config::AppConfig;
//!
//! # async fn example() -> adx_agent::error::Result<()> {
//! let config = AppConfig::load(None)?;
//! adx_agent::web::run(config, async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod mcp;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod tools;
pub mod types;
pub mod util;
pub mod web;
