//! Shared test helpers: a scripted MCP server and canned OpenAI responses.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::{Request, ResponseTemplate};

pub const SERVER_NAME: &str = "adx-mcp-test";
pub const QUERY_RESULT: &str = "IncidentId | Severity\n12345 | 2";

/// Input schema of the test `kusto` tool.
pub fn kusto_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "command": { "type": "string" },
            "parameters": {
                "type": "object",
                "properties": {
                    "cluster-uri": { "type": "string" },
                    "database": { "type": "string" },
                    "query": { "type": "string" }
                }
            }
        },
        "required": ["command", "parameters"]
    })
}

/// JSON-RPC reply for one client message, or `None` for notifications.
///
/// Calling the `kusto` tool with a query mentioning `MissingTable` yields an
/// `isError` result.
pub fn rpc_reply(message: &Value) -> Option<Value> {
    let id = message.get("id")?.clone();
    let method = message
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let result = match method {
        "initialize" => json!({
            "protocolVersion": "2025-03-26",
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": "0.1.0" }
        }),
        "tools/list" => json!({
            "tools": [
                {
                    "name": "kusto",
                    "description": "Run commands against Azure Data Explorer",
                    "inputSchema": kusto_input_schema()
                },
                {
                    "name": "monitor",
                    "inputSchema": { "type": "object", "properties": {} }
                }
            ]
        }),
        "tools/call" => {
            let params = message.get("params").cloned().unwrap_or_else(|| json!({}));
            let query = params
                .pointer("/arguments/parameters/query")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if query.contains("MissingTable") {
                json!({
                    "content": [{ "type": "text", "text": "Failed to resolve table 'MissingTable'" }],
                    "isError": true
                })
            } else {
                json!({
                    "content": [{ "type": "text", "text": QUERY_RESULT }],
                    "isError": false
                })
            }
        }
        _ => json!({}),
    };

    Some(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

/// wiremock responder for a streamable HTTP MCP endpoint that answers with JSON bodies.
pub fn streamable_http_responder(request: &Request) -> ResponseTemplate {
    let body: Value = request.body_json().unwrap_or_else(|_| json!({}));
    match rpc_reply(&body) {
        Some(reply) => ResponseTemplate::new(200).set_body_json(reply),
        None => ResponseTemplate::new(202),
    }
}

/// Methods of every JSON-RPC message the server received.
pub fn request_methods(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|request| request.body_json::<Value>().ok())
        .filter_map(|body| body.get("method").and_then(Value::as_str).map(str::to_string))
        .collect()
}

/// A plain assistant reply from the chat completions API.
pub fn completion_text(text: &str) -> Value {
    json!({
        "choices": [{
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 100, "completion_tokens": 10, "total_tokens": 110 }
    })
}

/// An assistant reply asking to run `query` through the `kusto` tool.
pub fn completion_kusto_call(call_id: &str, query: &str) -> Value {
    let arguments = json!({
        "command": "kusto_query",
        "parameters": {
            "cluster-uri": "https://mcp-data-explorer.eastus2.kusto.windows.net",
            "database": "Azure_Issues",
            "query": query
        }
    });
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": call_id,
                    "type": "function",
                    "function": { "name": "kusto", "arguments": arguments.to_string() }
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}
