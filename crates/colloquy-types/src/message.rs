//! Message types for OpenAI-compatible chat-completion APIs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::tool::ToolSchema;

/// Role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content: either a plain string or an ordered list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A typed content part within a multi-part message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
}

/// Reference to an image by URL (or data URL).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// A model-issued request to invoke a named function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

/// The function target and serialized arguments of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments as a raw JSON string; parsed lazily at execution time.
    pub arguments: String,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Links a tool-role message back to the originating call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, text)
    }

    /// A tool-role message answering the call with the given id.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }

    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(MessageContent::Text(text.into())),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Flatten the content to plain text, joining text parts.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s.clone()),
            Some(MessageContent::Parts(parts)) => Some(
                parts
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::Text { text } => Some(text.as_str()),
                        ContentPart::ImageUrl { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            None => None,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Token usage reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    /// Accumulate usage from another response.
    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Nested reasoning toggle for providers selected by the enabled-flag dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThinkingFlag {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ThinkingFlag {
    pub fn enabled() -> Self {
        Self {
            kind: "enabled".to_string(),
        }
    }
}

/// A request to a chat-completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_body: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingFlag>,
}

/// A buffered response from a chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice; only the first is consulted.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantReply,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a buffered completion choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

impl AssistantReply {
    /// Build the assistant message to append to the conversation log.
    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content,
            tool_calls: self.tool_calls.filter(|c| !c.is_empty()),
            tool_call_id: None,
            name: None,
        }
    }
}

/// One event in a streamed exchange.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// An incremental fragment, emitted in arrival order.
    Delta(StreamDelta),
    /// The terminal event; exactly one per decoded stream.
    Done(StreamFinal),
}

/// An incremental content and/or reasoning fragment.
#[derive(Debug, Clone, Default)]
pub struct StreamDelta {
    pub content: Option<String>,
    pub reasoning: Option<String>,
    pub accumulated_content: String,
    pub accumulated_reasoning: String,
}

/// Complete accumulated data for one request/response exchange.
#[derive(Debug, Clone)]
pub struct StreamFinal {
    /// The assembled assistant message, including any merged tool calls.
    pub message: Message,
    /// Full content, trimmed.
    pub content: String,
    /// Full reasoning, trimmed; `None` when the stream carried none.
    pub reasoning: Option<String>,
    pub usage: Usage,
    pub elapsed: Duration,
    pub finish_reason: Option<String>,
}

/// Final result of one invocation, after any tool-call rounds.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub reasoning: Option<String>,
    /// Usage accumulated across all rounds of the exchange.
    pub usage: Usage,
    pub elapsed: Duration,
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_roles_serialize_lowercase() {
        let msg = Message::system("be brief");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn tool_call_wire_shape() {
        let call = ToolCall::function("call_1", "get_weather", r#"{"city":"Oslo"}"#);
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "get_weather");
        assert_eq!(json["function"]["arguments"], r#"{"city":"Oslo"}"#);
    }

    #[test]
    fn tool_result_links_back_to_call() {
        let msg = Message::tool_result("call_1", "get_weather", "12C, cloudy");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        assert_eq!(json["name"], "get_weather");
    }

    #[test]
    fn content_parts_roundtrip() {
        let json = r#"{
            "role": "user",
            "content": [
                {"type": "text", "text": "what is this?"},
                {"type": "image_url", "image_url": {"url": "https://x/y.png"}}
            ]
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.text().as_deref(), Some("what is this?"));
        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["content"][1]["image_url"]["url"], "https://x/y.png");
    }

    #[test]
    fn null_content_deserializes_to_none() {
        let json = r#"{"role": "assistant", "content": null}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.content.is_none());
        assert!(msg.text().is_none());
    }

    #[test]
    fn usage_tolerates_missing_fields() {
        let usage: Usage = serde_json::from_str(r#"{"prompt_tokens": 7}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 7);
        assert_eq!(usage.completion_tokens, 0);
    }

    #[test]
    fn usage_add_accumulates() {
        let mut total = Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        total.add(&Usage {
            prompt_tokens: 3,
            completion_tokens: 2,
            total_tokens: 5,
        });
        assert_eq!(total.prompt_tokens, 13);
        assert_eq!(total.total_tokens, 20);
    }

    #[test]
    fn assistant_reply_with_empty_tool_calls_has_none() {
        let reply: AssistantReply =
            serde_json::from_str(r#"{"content": "hi", "tool_calls": []}"#).unwrap();
        let msg = reply.into_message();
        assert!(!msg.has_tool_calls());
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn chat_completion_parses_tool_call_reply() {
        let json = r#"{
            "id": "cmpl-1",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "call_1", "type": "function",
                         "function": {"name": "lookup", "arguments": "{}"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 4, "total_tokens": 13}
        }"#;
        let completion: ChatCompletion = serde_json::from_str(json).unwrap();
        let choice = &completion.choices[0];
        assert_eq!(choice.finish_reason.as_deref(), Some("tool_calls"));
        let msg = choice.message.clone().into_message();
        assert!(msg.has_tool_calls());
        assert_eq!(msg.tool_calls.unwrap()[0].function.name, "lookup");
    }

    #[test]
    fn chat_request_omits_unset_fields() {
        let request = ChatRequest {
            model: "test".into(),
            messages: vec![Message::user("hi")],
            stream: false,
            temperature: None,
            max_tokens: None,
            max_completion_tokens: None,
            tools: None,
            tool_choice: None,
            reasoning_effort: None,
            extra_body: None,
            thinking: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3); // model, messages, stream
    }
}
