//! Error hierarchy for Colloquy.

use thiserror::Error;

/// Top-level error type for all Colloquy operations.
#[derive(Debug, Error)]
pub enum ColloquyError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool-call loop exceeded {limit} iterations")]
    MaxToolIterations { limit: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors from the chat-completions API exchange.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timeout")]
    Timeout,

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream parse error: {0}")]
    StreamParse(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// True when the failure was the transport deadline, as opposed to a
    /// generic API failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout)
    }
}

/// Errors from tool execution.
///
/// All three kinds are reported back into the conversation as tool messages;
/// they never terminate the exchange.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    NotFound { name: String },

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguishable() {
        assert!(ApiError::Timeout.is_timeout());
        assert!(
            !ApiError::Server {
                status: 500,
                message: "boom".into()
            }
            .is_timeout()
        );
    }

    #[test]
    fn tool_error_messages_are_human_readable() {
        let err = ToolError::NotFound {
            name: "frobnicate".into(),
        };
        assert_eq!(err.to_string(), "Unknown tool: frobnicate");

        let err = ToolError::InvalidArguments {
            tool: "echo".into(),
            message: "expected object".into(),
        };
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn max_iterations_display() {
        let err = ColloquyError::MaxToolIterations { limit: 10 };
        assert_eq!(err.to_string(), "Tool-call loop exceeded 10 iterations");
    }
}
