//! McpTool — exposes a remote MCP procedure through the core Tool trait.

use crate::client::{McpClient, McpToolContent, McpToolInfo};
use colloquy_types::{Tool, ToolDefinition, ToolError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A tool backed by an MCP server.
///
/// Names follow the `mcp__<server>__<tool>` pattern to avoid collisions
/// with local tools or tools from other servers.
pub struct McpTool {
    namespaced_name: String,
    server_name: String,
    info: McpToolInfo,
    client: Arc<McpClient>,
}

impl McpTool {
    pub fn new(server_name: &str, info: McpToolInfo, client: Arc<McpClient>) -> Self {
        let namespaced_name = format!("mcp__{}__{}", server_name, info.name);
        Self {
            namespaced_name,
            server_name: server_name.to_string(),
            info,
            client,
        }
    }
}

impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.namespaced_name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.namespaced_name.clone(),
            description: format!("[MCP: {}] {}", self.server_name, self.info.description),
            parameters: self.info.input_schema.clone(),
        }
    }

    fn execute(
        &self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let result = self
                .client
                .call_tool(&self.info.name, args)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

            let text = result
                .content
                .iter()
                .map(|item| match item {
                    McpToolContent::Text { text } => text.clone(),
                    McpToolContent::Image { mime_type, .. } => {
                        format!("[image: {mime_type}]")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            if result.is_error {
                Err(ToolError::ExecutionFailed(text))
            } else {
                Ok(text)
            }
        })
    }
}
