//! The conversation/tool-orchestration engine.
//!
//! Both invokers drive the same bounded loop: build a request, send it,
//! append the assistant message, execute any requested tools, and repeat
//! until the model answers without tool calls. The buffered path returns a
//! single [`ChatResponse`]; the streaming path additionally forwards every
//! partial event to the caller as it arrives, surfacing one seamless token
//! stream across all rounds.

use crate::conversation::Conversation;
use crate::executor;
use crate::hooks::SessionHooks;
use crate::reasoning::split_tagged_reasoning;
use crate::registry::ToolRegistry;
use crate::request::{self, RequestOptions};
use colloquy_types::{
    ApiError, CapabilityRecord, ChatCompletion, ChatResponse, ChatTransport, ColloquyError,
    Message, StreamEvent, Usage, detect,
};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default bound on consecutive tool-call rounds, applied to both invokers.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Session-wide configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub request: RequestOptions,
    pub max_tool_iterations: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            request: RequestOptions::default(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }
}

/// A conversation session against one model over one transport.
pub struct Session {
    transport: Arc<dyn ChatTransport>,
    registry: ToolRegistry,
    conversation: Conversation,
    model: String,
    capability: CapabilityRecord,
    options: SessionOptions,
    hooks: SessionHooks,
}

impl Session {
    /// Create a session. Capabilities are detected from the model id once,
    /// here, and are immutable thereafter.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        model: impl Into<String>,
        registry: ToolRegistry,
    ) -> Self {
        let model = model.into();
        let capability = detect(&model);
        Self {
            transport,
            registry,
            conversation: Conversation::new(),
            model,
            capability,
            options: SessionOptions::default(),
            hooks: SessionHooks::default(),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_system_prompt(mut self, text: impl Into<String>) -> Self {
        self.conversation.set_system(text);
        self
    }

    pub fn hooks_mut(&mut self) -> &mut SessionHooks {
        &mut self.hooks
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn capability(&self) -> CapabilityRecord {
        self.capability
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn append(&mut self, message: Message) {
        self.conversation.push(message);
        self.hooks.message(self.conversation.messages());
    }

    fn build_payload(&self, stream: bool) -> Result<serde_json::Value, ApiError> {
        let request = request::build(
            &self.model,
            self.conversation.messages(),
            &self.registry.definitions(),
            self.capability,
            &self.options.request,
            stream,
        );
        request::to_payload(&request, self.options.request.extra.as_ref())
    }

    /// Notify the error observer and pass the error through.
    fn fail(&self, error: ColloquyError) -> ColloquyError {
        self.hooks.error(&error);
        error
    }

    /// Send a user message and drive the exchange to completion, buffered.
    pub async fn send(&mut self, text: impl Into<String>) -> Result<ChatResponse, ColloquyError> {
        self.append(Message::user(text.into()));
        let started = Instant::now();
        let mut usage = Usage::default();

        for round in 0..self.options.max_tool_iterations {
            tracing::debug!("Buffered round {round} ({})", self.model);
            let payload = self.build_payload(false).map_err(|e| self.fail(e.into()))?;
            self.hooks.request(&payload);

            let raw = match self.transport.chat(&payload).await {
                Ok(raw) => raw,
                Err(e) => return Err(self.fail(e.into())),
            };
            self.hooks.response_data(&raw);

            let completion: ChatCompletion = match serde_json::from_value(raw) {
                Ok(completion) => completion,
                Err(e) => {
                    return Err(self.fail(ApiError::InvalidResponse(e.to_string()).into()));
                }
            };
            if let Some(turn_usage) = &completion.usage {
                usage.add(turn_usage);
            }

            let Some(choice) = completion.choices.into_iter().next() else {
                return Err(self.fail(
                    ApiError::InvalidResponse("response carried no choices".into()).into(),
                ));
            };
            let finish_reason = choice.finish_reason;
            let reply = choice.message;
            let explicit_reasoning = reply
                .reasoning
                .clone()
                .or_else(|| reply.reasoning_content.clone());

            let message = reply.into_message();
            self.append(message.clone());

            if message.has_tool_calls() {
                let calls = message.tool_calls.clone().unwrap_or_default();
                let results =
                    executor::execute_tool_calls(&self.registry, &calls, &self.hooks).await;
                for result in results {
                    self.append(result);
                }
                continue;
            }

            // Terminal round: pull reasoning out of the reply
            let raw_content = message.text().unwrap_or_default();
            let (reasoning, content) = match explicit_reasoning {
                Some(reasoning) => (Some(reasoning), raw_content),
                None => match split_tagged_reasoning(&raw_content) {
                    Some((reasoning, remaining)) => (Some(reasoning), remaining),
                    None => (None, raw_content),
                },
            };

            let response = ChatResponse {
                content: content.trim().to_string(),
                reasoning: reasoning
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty()),
                usage,
                elapsed: started.elapsed(),
                finish_reason,
            };
            self.hooks.complete(&response, self.conversation.messages());
            return Ok(response);
        }

        Err(self.fail(ColloquyError::MaxToolIterations {
            limit: self.options.max_tool_iterations,
        }))
    }

    /// Send a user message, forwarding every partial event to `on_event`.
    ///
    /// Intermediate tool-calling rounds stay invisible to the caller: their
    /// terminal events are suppressed (observable only through the tool-call
    /// hook), so `on_event` sees one seamless delta stream followed by
    /// exactly one terminal event.
    pub async fn send_streaming<F>(
        &mut self,
        text: impl Into<String>,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<ChatResponse, ColloquyError>
    where
        F: FnMut(&StreamEvent),
    {
        self.append(Message::user(text.into()));
        let started = Instant::now();
        let mut usage = Usage::default();

        for round in 0..self.options.max_tool_iterations {
            tracing::debug!("Streaming round {round} ({})", self.model);
            let payload = self.build_payload(true).map_err(|e| self.fail(e.into()))?;
            self.hooks.request(&payload);

            let mut stream = match self.transport.chat_stream(&payload).await {
                Ok(stream) => stream,
                Err(e) => return Err(self.fail(e.into())),
            };

            let mut terminal = None;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(self.fail(ColloquyError::Cancelled));
                    }
                    event = stream.next() => match event {
                        Some(Ok(StreamEvent::Delta(delta))) => {
                            on_event(&StreamEvent::Delta(delta));
                        }
                        Some(Ok(StreamEvent::Done(done))) => terminal = Some(done),
                        Some(Err(e)) => return Err(self.fail(e.into())),
                        None => break,
                    }
                }
            }

            let Some(done) = terminal else {
                return Err(self.fail(
                    ApiError::StreamParse("stream ended without a terminal event".into()).into(),
                ));
            };
            usage.add(&done.usage);
            self.append(done.message.clone());

            if done.message.has_tool_calls() {
                // Suppress this round's terminal event, run the tools, loop
                let calls = done.message.tool_calls.clone().unwrap_or_default();
                let results =
                    executor::execute_tool_calls(&self.registry, &calls, &self.hooks).await;
                for result in results {
                    self.append(result);
                }
                continue;
            }

            let response = ChatResponse {
                content: done.content.clone(),
                reasoning: done.reasoning.clone(),
                usage: usage.clone(),
                elapsed: started.elapsed(),
                finish_reason: done.finish_reason.clone(),
            };
            on_event(&StreamEvent::Done(done));
            self.hooks.complete(&response, self.conversation.messages());
            return Ok(response);
        }

        Err(self.fail(ColloquyError::MaxToolIterations {
            limit: self.options.max_tool_iterations,
        }))
    }
}
