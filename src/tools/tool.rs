//! The tool abstraction seen by the generation loop.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use crate::error::AgentError;
use crate::provider::ToolDefinition;

/// Per-call context handed to [`Tool::execute`].
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Id of the tool call being executed, as issued by the model.
    pub call_id: Option<String>,
}

/// A callable the model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn input_schema(&self) -> &serde_json::Value;

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, AgentError>;

    /// Function definition advertised to the model.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema().clone(),
        }
    }
}

/// Find a tool by the name the model used.
pub fn find_tool<'a>(tools: &'a [Arc<dyn Tool>], name: &str) -> Option<&'a Arc<dyn Tool>> {
    tools.iter().find(|tool| tool.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Kusto {
        schema: serde_json::Value,
    }

    #[async_trait]
    impl Tool for Kusto {
        fn name(&self) -> &str {
            "kusto"
        }

        fn description(&self) -> &str {
            "Run KQL against Azure Data Explorer"
        }

        fn input_schema(&self) -> &serde_json::Value {
            &self.schema
        }

        async fn execute(
            &self,
            _args: &ToolArguments,
            _ctx: &ToolExecutionContext,
        ) -> Result<serde_json::Value, AgentError> {
            Ok(json!([]))
        }
    }

    #[test]
    fn definition_carries_schema() {
        let tool = Kusto {
            schema: json!({"type": "object", "properties": {"command": {"type": "string"}}}),
        };
        let def = tool.definition();
        assert_eq!(def.name, "kusto");
        assert_eq!(def.parameters["properties"]["command"]["type"], "string");
    }

    #[test]
    fn find_tool_matches_exact_name() {
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(Kusto { schema: json!({}) })];
        assert!(find_tool(&tools, "kusto").is_some());
        assert!(find_tool(&tools, "Kusto").is_none());
    }
}
