//! Tool Executor: resolves and runs model-requested tool calls.
//!
//! All failure kinds (unknown tool, unparseable arguments, handler error)
//! fold into tool-role messages carrying the error text, so the model can
//! react and the exchange continues. Failures here are never session-fatal.

use crate::hooks::SessionHooks;
use crate::registry::ToolRegistry;
use colloquy_types::{Message, ToolCall, ToolError};
use futures_util::future;

/// Result of one tool call, as reported to the tool-call observer.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub name: String,
    pub arguments: String,
    pub output: String,
    pub is_error: bool,
}

/// Execute every call from one assistant turn.
///
/// Calls run concurrently; result messages come back in call order, not
/// completion order, and the observer fires exactly once per call.
pub async fn execute_tool_calls(
    registry: &ToolRegistry,
    calls: &[ToolCall],
    hooks: &SessionHooks,
) -> Vec<Message> {
    let outcomes = future::join_all(calls.iter().map(|call| execute_one(registry, call))).await;

    calls
        .iter()
        .zip(outcomes)
        .map(|(call, outcome)| {
            hooks.tool_call(&outcome);
            Message::tool_result(&call.id, &call.function.name, outcome.output)
        })
        .collect()
}

async fn execute_one(registry: &ToolRegistry, call: &ToolCall) -> ToolOutcome {
    let name = &call.function.name;
    let raw_arguments = &call.function.arguments;

    let result = match registry.get(name) {
        None => Err(ToolError::NotFound { name: name.clone() }),
        Some(tool) => match parse_arguments(name, raw_arguments) {
            Err(e) => Err(e),
            Ok(args) => tool.execute(args).await,
        },
    };

    match result {
        Ok(output) => ToolOutcome {
            name: name.clone(),
            arguments: raw_arguments.clone(),
            output,
            is_error: false,
        },
        Err(e) => {
            tracing::warn!("Tool '{name}' failed: {e}");
            ToolOutcome {
                name: name.clone(),
                arguments: raw_arguments.clone(),
                output: e.to_string(),
                is_error: true,
            }
        }
    }
}

/// Parse the serialized arguments lazily, at execution time.
///
/// Some vendors send an empty string for zero-argument calls.
fn parse_arguments(tool: &str, raw: &str) -> Result<serde_json::Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}
