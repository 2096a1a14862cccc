//! MCP client — manages one server connection.
//!
//! Drives the protocol handshake (initialize + initialized notification),
//! tool discovery (tools/list), and tool invocation (tools/call). The
//! connection is Ready only once the initialize response has arrived.

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::transport::StdioTransport;
use serde::Deserialize;

/// MCP protocol version we speak.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// A remote procedure exposed by an MCP server.
#[derive(Debug, Clone)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Result of invoking a remote tool.
#[derive(Debug, Clone)]
pub struct McpToolResult {
    pub content: Vec<McpToolContent>,
    pub is_error: bool,
}

/// A content item in a tool result.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum McpToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

#[derive(Deserialize)]
struct ToolsListResult {
    tools: Vec<ToolEntry>,
}

#[derive(Deserialize)]
struct ToolEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_schema", rename = "inputSchema")]
    input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl ToolEntry {
    fn into_info(self) -> McpToolInfo {
        McpToolInfo {
            name: self.name,
            description: self.description.unwrap_or_default(),
            input_schema: self.input_schema,
        }
    }
}

#[derive(Deserialize)]
struct ToolCallResult {
    content: Vec<McpToolContent>,
    #[serde(default, rename = "isError")]
    is_error: bool,
}

/// Client for a single MCP server.
pub struct McpClient {
    name: String,
    transport: StdioTransport,
    tools: Vec<McpToolInfo>,
}

impl McpClient {
    /// Connect: spawn the process, handshake, discover tools.
    pub async fn connect(name: String, config: &McpServerConfig) -> Result<Self, McpError> {
        let transport = StdioTransport::spawn(
            &config.command,
            &config.args,
            &config.env,
            config.timeout(),
        )?;

        let init_params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "colloquy",
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let response = transport
            .send_request("initialize", Some(init_params))
            .await?;
        if let Some(error) = response.error {
            return Err(McpError::JsonRpc {
                server: name,
                code: error.code,
                message: error.message,
            });
        }

        transport
            .send_notification("notifications/initialized", None)
            .await?;

        let mut client = Self {
            name,
            transport,
            tools: Vec::new(),
        };
        client.tools = client.list_tools().await?;

        tracing::info!(
            "MCP server '{}' connected with {} tools",
            client.name,
            client.tools.len()
        );
        Ok(client)
    }

    /// Query the server for its current tool list.
    pub async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        let response = self.transport.send_request("tools/list", None).await?;

        if let Some(error) = response.error {
            return Err(McpError::JsonRpc {
                server: self.name.clone(),
                code: error.code,
                message: error.message,
            });
        }
        let Some(result) = response.result else {
            return Ok(Vec::new());
        };

        let list: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| McpError::Protocol(format!("Failed to parse tools/list response: {e}")))?;
        Ok(list.tools.into_iter().map(ToolEntry::into_info).collect())
    }

    /// Invoke a tool on this server.
    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<McpToolResult, McpError> {
        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });

        let response = self.transport.send_request("tools/call", Some(params)).await?;

        if let Some(error) = response.error {
            return Err(McpError::JsonRpc {
                server: self.name.clone(),
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.ok_or_else(|| {
            McpError::Protocol("tools/call response has neither result nor error".to_string())
        })?;

        let call_result: ToolCallResult = serde_json::from_value(result)
            .map_err(|e| McpError::Protocol(format!("Failed to parse tools/call result: {e}")))?;

        Ok(McpToolResult {
            content: call_result.content,
            is_error: call_result.is_error,
        })
    }

    /// Tools discovered at connect time.
    pub fn tools(&self) -> &[McpToolInfo] {
        &self.tools
    }

    pub fn server_name(&self) -> &str {
        &self.name
    }

    /// Tear down the connection; all pending calls observe rejection.
    pub async fn shutdown(self) {
        self.transport.shutdown().await;
    }
}
