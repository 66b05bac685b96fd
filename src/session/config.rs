//! Per-session configuration store: credential, tool-server URL and transport.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationErrors;
use crate::mcp::TransportKind;

pub const FIELD_CREDENTIAL: &str = "llm_credential";
pub const FIELD_URL: &str = "tool_server_url";
pub const FIELD_TRANSPORT: &str = "transport";

static CREDENTIAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sk-\S+$").expect("credential regex must compile"));

/// Unvalidated form input, as submitted by the user.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigDraft {
    pub llm_credential: String,
    pub tool_server_url: String,
    /// Transport name, `sse` or `streamable_http`.
    pub transport: String,
}

impl fmt::Debug for ConfigDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDraft")
            .field("llm_credential", &mask(&self.llm_credential))
            .field("tool_server_url", &self.tool_server_url)
            .field("transport", &self.transport)
            .finish()
    }
}

impl ConfigDraft {
    /// Check every field, collecting one error per offending field.
    pub fn validate(&self) -> Result<SessionConfig, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let credential = self.llm_credential.trim();
        if credential.is_empty() {
            errors.push(FIELD_CREDENTIAL, "OpenAI API Key is required");
        } else if !CREDENTIAL_PATTERN.is_match(credential) {
            errors.push(FIELD_CREDENTIAL, "OpenAI API Key should start with 'sk-'");
        }

        let url = self.tool_server_url.trim();
        let parsed = if url.is_empty() {
            errors.push(FIELD_URL, "MCP Server URL is required");
            None
        } else {
            match Url::parse(url) {
                Ok(parsed)
                    if matches!(parsed.scheme(), "http" | "https")
                        && parsed.host_str().is_some() =>
                {
                    Some(parsed)
                }
                Ok(_) => {
                    errors.push(FIELD_URL, "MCP Server URL must start with http:// or https://");
                    None
                }
                Err(e) => {
                    errors.push(FIELD_URL, format!("MCP Server URL is not a valid URL: {e}"));
                    None
                }
            }
        };

        let transport = match self.transport.trim() {
            "" => Some(TransportKind::default()),
            name => match name.parse::<TransportKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    errors.push(
                        FIELD_TRANSPORT,
                        format!("Transport must be 'sse' or 'streamable_http', got '{name}'"),
                    );
                    None
                }
            },
        };

        match (parsed, transport) {
            (Some(_), Some(transport)) if errors.is_empty() => Ok(SessionConfig {
                llm_credential: credential.to_string(),
                tool_server_url: url.to_string(),
                transport,
            }),
            _ => Err(errors),
        }
    }
}

/// A validated, complete session configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub llm_credential: String,
    pub tool_server_url: String,
    pub transport: TransportKind,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("llm_credential", &mask(&self.llm_credential))
            .field("tool_server_url", &self.tool_server_url)
            .field("transport", &self.transport)
            .finish()
    }
}

/// Non-secret view of the configuration for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerDetails {
    pub url: String,
    pub transport: TransportKind,
    pub transport_description: &'static str,
}

impl From<&SessionConfig> for ServerDetails {
    fn from(config: &SessionConfig) -> Self {
        Self {
            url: config.tool_server_url.clone(),
            transport: config.transport,
            transport_description: config.transport.description(),
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let prefix: String = secret.chars().take(3).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(credential: &str, url: &str, transport: &str) -> ConfigDraft {
        ConfigDraft {
            llm_credential: credential.into(),
            tool_server_url: url.into(),
            transport: transport.into(),
        }
    }

    #[test]
    fn well_formed_draft_validates() {
        let config = draft("sk-test123", "https://example.com/sse", "sse")
            .validate()
            .unwrap();
        assert_eq!(config.llm_credential, "sk-test123");
        assert_eq!(config.tool_server_url, "https://example.com/sse");
        assert_eq!(config.transport, TransportKind::Sse);

        let http = draft("sk-proj-abc", "http://localhost:8080/mcp", "streamable_http")
            .validate()
            .unwrap();
        assert_eq!(http.transport, TransportKind::StreamableHttp);
    }

    #[test]
    fn ftp_url_is_rejected_on_url_field() {
        let errors = draft("sk-test123", "ftp://bad", "sse").validate().unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(errors.for_field(FIELD_URL).is_some());
    }

    #[test]
    fn every_bad_field_is_reported() {
        let errors = draft("pk-live", "not a url", "stdio").validate().unwrap_err();
        assert!(errors.for_field(FIELD_CREDENTIAL).is_some());
        assert!(errors.for_field(FIELD_URL).is_some());
        assert!(errors.for_field(FIELD_TRANSPORT).is_some());
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = ConfigDraft::default().validate().unwrap_err();
        assert!(errors
            .for_field(FIELD_CREDENTIAL)
            .is_some_and(|m| m.contains("required")));
        assert!(errors.for_field(FIELD_URL).is_some());
        assert!(errors.for_field(FIELD_TRANSPORT).is_none());
    }

    #[test]
    fn credential_with_whitespace_is_rejected() {
        let errors = draft("sk-abc def", "https://example.com/sse", "sse")
            .validate()
            .unwrap_err();
        assert!(errors.for_field(FIELD_CREDENTIAL).is_some());
    }

    #[test]
    fn debug_masks_credential() {
        let config = draft("sk-supersecret", "https://example.com/sse", "sse")
            .validate()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("sk-***"));
    }
}
