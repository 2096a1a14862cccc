//! Async stream that decodes chat-completion bytes into typed StreamEvents.
//!
//! Frames arrive as `data:` lines whose JSON records carry content deltas,
//! reasoning deltas, and positionally-indexed tool-call fragments. Deltas are
//! surfaced immediately in arrival order; tool calls are reassembled across
//! frames and attached to a synthetic assistant message on the terminal event.

use crate::sse::{SseLine, SseLineDecoder};
use colloquy_types::{
    ApiError, FunctionCall, Message, MessageContent, Role, StreamDelta, StreamEvent, StreamFinal,
    ToolCall, Usage,
};
use futures_core::Stream;
use pin_project_lite::pin_project;
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

/// Wire shape of one streaming frame.
#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallDelta>,
}

#[derive(Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Deserialize)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// A tool call being reassembled from positional deltas.
#[derive(Default)]
struct ToolCallDraft {
    id: String,
    name: String,
    arguments: String,
}

/// Decoder state shared across polls.
struct DecodeState {
    lines: SseLineDecoder,
    queue: VecDeque<StreamEvent>,
    content: String,
    reasoning: String,
    role: Option<Role>,
    drafts: Vec<ToolCallDraft>,
    usage: Option<Usage>,
    finish_reason: Option<String>,
    started: Instant,
    saw_done: bool,
    finished: bool,
}

impl DecodeState {
    fn new() -> Self {
        Self {
            lines: SseLineDecoder::new(),
            queue: VecDeque::new(),
            content: String::new(),
            reasoning: String::new(),
            role: None,
            drafts: Vec::new(),
            usage: None,
            finish_reason: None,
            started: Instant::now(),
            saw_done: false,
            finished: false,
        }
    }

    fn ingest(&mut self, line: SseLine) {
        match line {
            SseLine::Done => self.saw_done = true,
            SseLine::Data(json) => self.ingest_record(&json),
        }
    }

    fn ingest_record(&mut self, json: &str) {
        let chunk: ChatChunk = match serde_json::from_str(json) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Skipping malformed stream record: {e}");
                return;
            }
        };

        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return;
        };

        if let Some(reason) = choice.finish_reason {
            self.finish_reason = Some(reason);
        }

        let delta = choice.delta;

        // First role marker wins
        if self.role.is_none() {
            self.role = delta.role;
        }

        let content = delta.content.unwrap_or_default();
        let reasoning = delta
            .reasoning
            .or(delta.reasoning_content)
            .unwrap_or_default();

        if !content.is_empty() || !reasoning.is_empty() {
            self.content.push_str(&content);
            self.reasoning.push_str(&reasoning);
            self.queue.push_back(StreamEvent::Delta(StreamDelta {
                content: (!content.is_empty()).then_some(content),
                reasoning: (!reasoning.is_empty()).then_some(reasoning),
                accumulated_content: self.content.clone(),
                accumulated_reasoning: self.reasoning.clone(),
            }));
        }

        for fragment in delta.tool_calls {
            while self.drafts.len() <= fragment.index {
                self.drafts.push(ToolCallDraft::default());
            }
            let draft = &mut self.drafts[fragment.index];
            // id/name are overwritten only when newly present; argument
            // fragments always concatenate
            if let Some(id) = fragment.id {
                draft.id = id;
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    draft.name = name;
                }
                if let Some(args) = function.arguments {
                    draft.arguments.push_str(&args);
                }
            }
        }
    }

    /// Assemble the assistant message and enqueue the single terminal event.
    fn finalize(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let tool_calls: Vec<ToolCall> = self
            .drafts
            .drain(..)
            .map(|d| ToolCall {
                id: d.id,
                kind: "function".to_string(),
                function: FunctionCall {
                    name: d.name,
                    arguments: d.arguments,
                },
            })
            .collect();

        let content = std::mem::take(&mut self.content);
        let reasoning = std::mem::take(&mut self.reasoning);

        let message = Message {
            role: self.role.take().unwrap_or(Role::Assistant),
            content: if content.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(MessageContent::Text(content.clone()))
            },
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
            name: None,
        };

        let reasoning = reasoning.trim();
        self.queue.push_back(StreamEvent::Done(StreamFinal {
            message,
            content: content.trim().to_string(),
            reasoning: (!reasoning.is_empty()).then(|| reasoning.to_string()),
            usage: self.usage.take().unwrap_or_default(),
            elapsed: self.started.elapsed(),
            finish_reason: self.finish_reason.take(),
        }));
    }
}

pin_project! {
    /// An async stream of typed [`StreamEvent`]s decoded from raw response bytes.
    pub struct ChatStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
        state: DecodeState,
    }
}

impl ChatStream {
    /// Create a new ChatStream from a response byte stream.
    pub fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            state: DecodeState::new(),
        }
    }
}

impl Stream for ChatStream {
    type Item = Result<StreamEvent, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.state.queue.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.state.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes);
                    for line in this.state.lines.feed(&text) {
                        this.state.ingest(line);
                    }
                    // The terminator line ends the exchange even if the
                    // connection lingers
                    if this.state.saw_done {
                        this.state.finalize();
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.state.finished = true;
                    let err = if e.is_timeout() {
                        ApiError::Timeout
                    } else {
                        ApiError::Network(e.to_string())
                    };
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.state.finalize();
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
