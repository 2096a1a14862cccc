//! OpenAI-compatible chat-completions client with SSE streaming for Colloquy.

mod client;
mod sse;
mod stream;

pub use client::OpenAiClient;
pub use sse::{SseLine, SseLineDecoder};
pub use stream::ChatStream;
