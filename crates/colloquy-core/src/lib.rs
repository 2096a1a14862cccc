//! Conversation and tool-orchestration engine for Colloquy.
//!
//! A [`Session`] owns the message log, the registered tools, and a
//! [`ChatTransport`](colloquy_types::ChatTransport); it drives the buffered
//! and streaming request/response cycles, transparently executing
//! model-requested tool calls until the model produces a final answer.

mod conversation;
mod executor;
mod hooks;
mod reasoning;
mod registry;
mod request;
mod session;

pub use conversation::Conversation;
pub use executor::{ToolOutcome, execute_tool_calls};
pub use hooks::SessionHooks;
pub use reasoning::split_tagged_reasoning;
pub use registry::ToolRegistry;
pub use request::{RequestOptions, build, to_payload};
pub use session::{DEFAULT_MAX_TOOL_ITERATIONS, Session, SessionOptions};
