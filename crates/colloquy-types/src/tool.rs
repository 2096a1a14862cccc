//! Tool trait and related types.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::error::ToolError;

/// A tool definition sent to the API: name, description, parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON-schema description of the accepted arguments.
    pub parameters: serde_json::Value,
}

/// The OpenAI wire wrapper around a tool definition.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolDefinition,
}

impl From<ToolDefinition> for ToolSchema {
    fn from(function: ToolDefinition) -> Self {
        Self {
            kind: "function".to_string(),
            function,
        }
    }
}

/// Trait implemented by everything the model can call.
///
/// Definitions are supplied by the caller at session construction; the engine
/// never mutates them, only invokes handlers.
pub trait Tool: Send + Sync {
    /// The unique name of this tool (used in API requests).
    fn name(&self) -> &str;

    /// The definition to advertise to the API.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with already-parsed JSON arguments.
    fn execute(
        &self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>>;
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send>>;

/// A tool backed by an async closure.
pub struct FnTool {
    definition: ToolDefinition,
    handler: Box<dyn Fn(serde_json::Value) -> HandlerFuture + Send + Sync>,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        handler: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            definition: ToolDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
            handler: Box::new(move |args| Box::pin(handler(args))),
        }
    }
}

impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn execute(
        &self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        (self.handler)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_tool() -> FnTool {
        FnTool::new(
            "echo",
            "Echo the input back",
            serde_json::json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            |args| async move {
                Ok(args["text"].as_str().unwrap_or_default().to_string())
            },
        )
    }

    #[test]
    fn tool_schema_wire_shape() {
        let schema: ToolSchema = echo_tool().definition().into();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "echo");
        assert_eq!(json["function"]["parameters"]["type"], "object");
    }

    #[tokio::test]
    async fn fn_tool_executes_handler() {
        let tool = echo_tool();
        let out = tool
            .execute(serde_json::json!({"text": "hello"}))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn fn_tool_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FnTool>();
    }
}
