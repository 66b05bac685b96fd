//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

/// Default log filter when neither `--log-filter` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "adx_agent=info,tower_http=info";

/// Azure Data Explorer incident-analyst chat server
#[derive(Parser, Debug)]
#[command(name = "adx-agent", version, about = "Chat with an MCP-backed KQL agent")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// tracing filter directive, e.g. `adx_agent=debug`
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl Cli {
    /// Apply flag overrides on top of a loaded config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["adx-agent", "--host", "0.0.0.0", "-p", "9000"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(cli.config.is_none());
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::parse_from(["adx-agent"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, AppConfig::default());
    }
}
