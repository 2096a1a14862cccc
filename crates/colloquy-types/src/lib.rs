//! Shared types and error hierarchy for Colloquy.

pub mod capability;
pub mod error;
pub mod message;
pub mod tool;
pub mod transport;

pub use capability::{CapabilityRecord, ReasoningDialect, ReasoningEffort, detect};
pub use error::{ApiError, ColloquyError, ConfigError, ToolError};
pub use message::*;
pub use tool::*;
pub use transport::{ChatTransport, EventStream};
