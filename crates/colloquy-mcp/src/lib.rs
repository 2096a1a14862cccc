//! MCP (Model Context Protocol) client implementation for Colloquy.
//!
//! Talks to stdio-based MCP servers over newline-delimited JSON-RPC 2.0.
//! Each configured server is spawned as a child process, initialized with a
//! handshake, and its discovered tools are exposed through the core
//! [`Tool`](colloquy_types::Tool) trait under namespaced names. Client
//! handles live in a caller-owned [`McpRegistry`] with an explicit shutdown;
//! there is no global state and no process-exit hook.

pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod registry;
pub mod tool;
mod transport;

pub use client::{McpClient, McpToolInfo, McpToolResult};
pub use config::{McpConfig, McpServerConfig};
pub use error::McpError;
pub use registry::McpRegistry;
pub use tool::McpTool;
