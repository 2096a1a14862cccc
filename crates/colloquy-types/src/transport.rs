//! Transport trait for chat-completion endpoints.

use crate::error::ApiError;
use crate::message::StreamEvent;
use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;

/// A boxed async stream of decoded events from a streaming exchange.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ApiError>> + Send>>;

/// Trait for the HTTP collaborator that carries chat-completion requests.
///
/// Implementations own the base URL, credentials, and timeout; the engine
/// hands them a fully built payload. Dyn-compatible so the invokers work
/// with `Arc<dyn ChatTransport>`.
pub trait ChatTransport: Send + Sync {
    /// Send a buffered request and return the full JSON response body.
    fn chat<'a>(
        &'a self,
        payload: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ApiError>> + Send + 'a>>;

    /// Send a streaming request and return the decoded event stream.
    fn chat_stream<'a>(
        &'a self,
        payload: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, ApiError>> + Send + 'a>>;

    /// Transport name for logging/display.
    fn name(&self) -> &str;
}
