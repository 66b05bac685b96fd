//! Text generation with tool loop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AgentError;
use crate::provider::{ModelProvider, ProviderRequest, ToolDefinition};
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{find_tool, Tool, ToolExecutionContext};
use crate::types::*;

/// Generate text with an optional tool loop.
///
/// If the model returns tool calls, they are executed and fed back until the model
/// produces a response without tool calls. Running out of `max_iterations` model calls
/// before that is an error. Tool failures do not abort the loop; they are reported to
/// the model as error results so it can recover.
pub async fn generate_text(
    provider: &dyn ModelProvider,
    mut messages: Vec<ModelMessage>,
    settings: &GenerationSettings,
    tools: &[Arc<dyn Tool>],
    max_iterations: usize,
) -> Result<GenerateTextResult, AgentError> {
    let tool_defs: Option<Vec<ToolDefinition>> =
        (!tools.is_empty()).then(|| tools.iter().map(|t| t.definition()).collect());

    let mut steps = Vec::new();
    let mut total_usage = Usage::default();

    for iteration in 0..max_iterations {
        let request = ProviderRequest {
            messages: messages.clone(),
            settings: settings.clone(),
            tools: tool_defs.clone(),
        };

        debug!(iteration, messages = messages.len(), "generate_text: calling provider");
        let response = provider.generate_text(&request).await?;
        total_usage.merge(&response.usage);

        let mut step = GenerationStep {
            text: response.text.clone(),
            tool_calls: response.tool_calls.clone(),
            tool_results: Vec::new(),
            usage: response.usage,
            finish_reason: response.finish_reason,
        };

        if response.tool_calls.is_empty() {
            steps.push(step);
            return Ok(GenerateTextResult {
                text: response.text,
                steps,
                usage: total_usage,
                finish_reason: response.finish_reason,
            });
        }

        messages.push(ModelMessage::assistant_tool_calls(
            &response.text,
            &response.tool_calls,
        ));

        for call in &response.tool_calls {
            let result = execute_tool_call(tools, call).await;
            step.tool_results.push(result.clone());
            messages.push(ModelMessage::tool_result(result));
        }
        steps.push(step);
    }

    warn!(max_iterations, "generate_text: tool loop did not converge");
    Err(AgentError::IterationLimit(max_iterations))
}

async fn execute_tool_call(tools: &[Arc<dyn Tool>], call: &AgentToolCall) -> AgentToolResult {
    let Some(tool) = find_tool(tools, &call.name) else {
        warn!(tool = %call.name, "Tool not found");
        return AgentToolResult {
            tool_call_id: call.id.clone(),
            result: serde_json::json!({ "error": format!("Tool '{}' not found", call.name) }),
            is_error: true,
        };
    };

    let ctx = ToolExecutionContext {
        call_id: Some(call.id.clone()),
    };
    let args = ToolArguments::new(call.arguments.clone());
    match tool.execute(&args, &ctx).await {
        Ok(value) => AgentToolResult {
            tool_call_id: call.id.clone(),
            result: value,
            is_error: false,
        },
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool execution failed");
            AgentToolResult {
                tool_call_id: call.id.clone(),
                result: serde_json::json!({ "error": e.to_string() }),
                is_error: true,
            }
        }
    }
}
