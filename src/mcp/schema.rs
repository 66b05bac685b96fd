//! MCP schema types.

use serde::{Deserialize, Serialize};

const NO_DESCRIPTION: &str = "No description";

/// Schema for a tool exposed by an MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

/// Name and description of a tool, as shown in the tool inventory.
///
/// Fetched once per connection and never refreshed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

impl From<&McpToolSchema> for ToolDescriptor {
    fn from(schema: &McpToolSchema) -> Self {
        let description = schema
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(NO_DESCRIPTION);
        Self {
            name: schema.name.clone(),
            description: description.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_falls_back_when_description_missing() {
        let schema = McpToolSchema {
            name: "kusto".into(),
            description: None,
            input_schema: json!({"type": "object"}),
        };
        let descriptor = ToolDescriptor::from(&schema);
        assert_eq!(descriptor.name, "kusto");
        assert_eq!(descriptor.description, "No description");

        let blank = McpToolSchema {
            description: Some("   ".into()),
            ..schema
        };
        assert_eq!(ToolDescriptor::from(&blank).description, "No description");
    }
}
