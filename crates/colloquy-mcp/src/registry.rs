//! McpRegistry — caller-owned set of MCP server connections.
//!
//! The registry is an explicit object the application holds and shuts down;
//! client handles never live in global state and nothing hooks process exit.

use crate::client::McpClient;
use crate::config::McpConfig;
use crate::tool::McpTool;
use std::sync::Arc;

/// Connections to all configured MCP servers.
pub struct McpRegistry {
    clients: Vec<Arc<McpClient>>,
}

impl McpRegistry {
    /// Start every configured server.
    ///
    /// Servers that fail to start are logged and skipped; the session
    /// continues with whatever connected.
    pub async fn start(config: &McpConfig) -> Self {
        let mut clients = Vec::new();

        for (name, server_config) in &config.servers {
            match McpClient::connect(name.clone(), server_config).await {
                Ok(client) => clients.push(Arc::new(client)),
                Err(e) => {
                    tracing::warn!("Failed to start MCP server '{name}': {e}");
                }
            }
        }

        Self { clients }
    }

    /// Adapt every discovered remote procedure into a registrable tool.
    pub fn tools(&self) -> Vec<Arc<McpTool>> {
        let mut tools = Vec::new();
        for client in &self.clients {
            for info in client.tools() {
                tools.push(Arc::new(McpTool::new(
                    client.server_name(),
                    info.clone(),
                    Arc::clone(client),
                )));
            }
        }
        tools
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Connected servers and their tool counts.
    pub fn server_summary(&self) -> Vec<(&str, usize)> {
        self.clients
            .iter()
            .map(|c| (c.server_name(), c.tools().len()))
            .collect()
    }

    /// Shut down every connected server.
    pub async fn shutdown(self) {
        for client in self.clients {
            if let Ok(client) = Arc::try_unwrap(client) {
                client.shutdown().await;
            }
        }
    }
}
