//! Observer callbacks.
//!
//! The engine only ever calls out through these hooks; it never depends on
//! their behavior. All hooks are optional and default to no-ops.

use crate::executor::ToolOutcome;
use colloquy_types::{ChatResponse, ColloquyError, Message};

type MessageHook = Box<dyn Fn(&[Message]) + Send + Sync>;
type ToolCallHook = Box<dyn Fn(&ToolOutcome) + Send + Sync>;
type PayloadHook = Box<dyn Fn(&serde_json::Value) + Send + Sync>;
type ErrorHook = Box<dyn Fn(&ColloquyError) + Send + Sync>;
type CompleteHook = Box<dyn Fn(&ChatResponse, &[Message]) + Send + Sync>;

/// Optional observer callbacks for one session.
#[derive(Default)]
pub struct SessionHooks {
    /// Called with the full log after every append.
    pub on_message: Option<MessageHook>,
    /// Called once per tool call, success or failure.
    pub on_tool_call: Option<ToolCallHook>,
    /// Called with the payload before every send.
    pub on_request: Option<PayloadHook>,
    /// Called with the raw body after every buffered receive.
    pub on_response_data: Option<PayloadHook>,
    /// Called on any terminal failure.
    pub on_error: Option<ErrorHook>,
    /// Called once per top-level invocation, on success.
    pub on_complete: Option<CompleteHook>,
}

impl SessionHooks {
    pub(crate) fn message(&self, log: &[Message]) {
        if let Some(hook) = &self.on_message {
            hook(log);
        }
    }

    pub(crate) fn tool_call(&self, outcome: &ToolOutcome) {
        if let Some(hook) = &self.on_tool_call {
            hook(outcome);
        }
    }

    pub(crate) fn request(&self, payload: &serde_json::Value) {
        if let Some(hook) = &self.on_request {
            hook(payload);
        }
    }

    pub(crate) fn response_data(&self, raw: &serde_json::Value) {
        if let Some(hook) = &self.on_response_data {
            hook(raw);
        }
    }

    pub(crate) fn error(&self, error: &ColloquyError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }

    pub(crate) fn complete(&self, response: &ChatResponse, log: &[Message]) {
        if let Some(hook) = &self.on_complete {
            hook(response, log);
        }
    }
}
