//! Process configuration (layered: defaults > TOML file > env > CLI flags).
//!
//! The LLM credential is not part of it: each session supplies its own.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::agent::prompt::KustoDefaults;
use crate::error::AgentError;
use crate::provider::openai::DEFAULT_BASE_URL;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "ADX_AGENT_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub kusto: KustoDefaults,
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Language-model settings shared by every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f64,
    pub base_url: String,
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o".to_string(),
            temperature: 0.0,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_tool_iterations: usize,
    pub turn_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Number of most recent turns replayed per request. Unset replays everything.
    pub history_window: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: 25,
            turn_timeout_secs: 180,
            connect_timeout_secs: 30,
            history_window: None,
        }
    }
}

impl AgentConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// `explicit` (from `--config`) wins over `$ADX_AGENT_CONFIG`, which wins over the
    /// platform config directory. Only an explicit path is required to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AgentError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let from_env = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, AgentError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            AgentError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// `<platform config dir>/adx-agent/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "adx-agent")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AgentError> {
        if let Some(host) = lookup("ADX_AGENT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env(&lookup, "ADX_AGENT_PORT")? {
            self.server.port = port;
        }
        if let Some(model) = lookup("ADX_AGENT_MODEL") {
            self.model.name = model;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.model.base_url = base_url;
        }
        if let Some(secs) = parse_env(&lookup, "ADX_AGENT_TURN_TIMEOUT_SECS")? {
            self.agent.turn_timeout_secs = secs;
        }
        if let Some(secs) = parse_env(&lookup, "ADX_AGENT_CONNECT_TIMEOUT_SECS")? {
            self.agent.connect_timeout_secs = secs;
        }
        if let Some(window) = parse_env(&lookup, "ADX_AGENT_HISTORY_WINDOW")? {
            self.agent.history_window = Some(window);
        }
        if let Some(uri) = lookup("ADX_AGENT_KUSTO_CLUSTER_URI") {
            self.kusto.cluster_uri = uri;
        }
        if let Some(database) = lookup("ADX_AGENT_KUSTO_DATABASE") {
            self.kusto.database = database;
        }
        Ok(())
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), AgentError> {
        let mut problems = Vec::new();

        if self.server.port == 0 {
            problems.push("server.port must be non-zero".to_string());
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            problems.push(format!(
                "model.temperature must be within [0, 2], got {}",
                self.model.temperature
            ));
        }
        match Url::parse(&self.model.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => problems.push(format!(
                "model.base_url must be an http(s) URL, got '{}'",
                self.model.base_url
            )),
        }
        if self.agent.max_tool_iterations == 0 {
            problems.push("agent.max_tool_iterations must be at least 1".to_string());
        }
        if self.agent.turn_timeout_secs == 0 || self.agent.connect_timeout_secs == 0 {
            problems.push("agent timeouts must be non-zero".to_string());
        }
        if self.agent.history_window == Some(0) {
            problems.push("agent.history_window must be at least 1 when set".to_string());
        }
        if self.sessions.idle_ttl_secs == 0 || self.sessions.sweep_interval_secs == 0 {
            problems.push("sessions intervals must be non-zero".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AgentError::Configuration(problems.join("; ")))
        }
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AgentError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AgentError::Configuration(format!("{key}='{raw}': {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.model.temperature, 0.0);
        assert_eq!(config.agent.turn_timeout(), Duration::from_secs(180));
        assert_eq!(config.agent.history_window, None);
        assert_eq!(config.kusto.database, "Azure_Issues");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[agent]
history_window = 40

[kusto]
database = "Incidents"
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.agent.history_window, Some(40));
        assert_eq!(config.agent.max_tool_iterations, 25);
        assert_eq!(config.kusto.database, "Incidents");
        assert_eq!(config.kusto.table, "Azure_Issues");
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(m) if m.contains("absent.toml")));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[
                ("ADX_AGENT_PORT", "8080"),
                ("ADX_AGENT_MODEL", "gpt-4.1"),
                ("OPENAI_BASE_URL", "http://localhost:4000/v1"),
                ("ADX_AGENT_HISTORY_WINDOW", "12"),
                ("ADX_AGENT_KUSTO_DATABASE", "Other"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.model.name, "gpt-4.1");
        assert_eq!(config.model.base_url, "http://localhost:4000/v1");
        assert_eq!(config.agent.history_window, Some(12));
        assert_eq!(config.kusto.database, "Other");
        config.validate().unwrap();
    }

    #[test]
    fn unparsable_env_value_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(lookup(&[("ADX_AGENT_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, AgentError::Configuration(m) if m.contains("ADX_AGENT_PORT")));
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.model.temperature = 3.0;
        config.model.base_url = "ftp://models".into();
        config.agent.history_window = Some(0);
        let AgentError::Configuration(message) = config.validate().unwrap_err() else {
            panic!("expected configuration error");
        };
        assert!(message.contains("server.port"));
        assert!(message.contains("temperature"));
        assert!(message.contains("base_url"));
        assert!(message.contains("history_window"));
    }
}
