//! HTTP client construction and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::AgentError;

/// Build a reqwest client with the given overall request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, AgentError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> AgentError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => AgentError::Authentication(message),
        429 => AgentError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => AgentError::api(status, message),
    }
}

fn error_object(body: &str) -> Option<serde_json::Value> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned())
}

fn extract_error_message(body: &str) -> Option<String> {
    error_object(body)
        .and_then(|e| e.get("message").and_then(|m| m.as_str()).map(str::to_string))
}

fn extract_retry_after(body: &str) -> Option<u64> {
    error_object(body)
        .and_then(|e| e.get("retry_after").and_then(|r| r.as_f64()))
        .map(|s| (s * 1000.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_uses_api_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let err = status_to_error(401, body);
        assert!(matches!(err, AgentError::Authentication(m) if m == "Incorrect API key provided"));
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let err = status_to_error(429, r#"{"error":{"retry_after":1.5}}"#);
        assert!(matches!(
            err,
            AgentError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
    }

    #[test]
    fn other_status_keeps_raw_body() {
        let err = status_to_error(500, "upstream exploded");
        assert!(matches!(err, AgentError::Api { status: 500, message } if message == "upstream exploded"));
    }

    #[test]
    fn bearer_headers_set_authorization() {
        let headers = bearer_headers("sk-test");
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
    }
}
