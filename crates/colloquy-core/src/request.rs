//! Request Builder: conversation state + tools + capabilities → wire payload.

use colloquy_types::{
    ApiError, CapabilityRecord, ChatRequest, Message, ReasoningDialect, ReasoningEffort,
    ThinkingFlag, ToolDefinition, ToolSchema,
};

/// Per-request knobs supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub effort: ReasoningEffort,
    /// Tool-choice policy; defaults to `"auto"` whenever tools are present.
    pub tool_choice: Option<serde_json::Value>,
    /// Raw overrides merged into the payload last. A JSON `null` value
    /// removes the key; anything else overwrites it.
    pub extra: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Assemble a typed request.
///
/// Exactly one reasoning-configuration block is attached, selected by the
/// capability dialect. No I/O and no hidden state; identical inputs
/// produce identical requests.
pub fn build(
    model: &str,
    messages: &[Message],
    tools: &[ToolDefinition],
    capability: CapabilityRecord,
    options: &RequestOptions,
    stream: bool,
) -> ChatRequest {
    let mut max_tokens = options.max_tokens;
    let mut max_completion_tokens = None;
    let mut reasoning_effort = None;
    let mut extra_body = None;
    let mut thinking = None;

    match capability.dialect {
        ReasoningDialect::None => {}
        ReasoningDialect::OpenAi => {
            reasoning_effort = Some(options.effort.as_str().to_string());
            // These models reject the generic field; any requested limit
            // moves to the completion-token field
            max_completion_tokens = max_tokens.take();
        }
        ReasoningDialect::ThinkingBudget => {
            extra_body = Some(serde_json::json!({
                "google": {
                    "thinking_config": {
                        "thinking_budget": options.effort.budget_tokens(),
                        "include_thoughts": true,
                    }
                }
            }));
        }
        ReasoningDialect::EnabledFlag => {
            thinking = Some(ThinkingFlag::enabled());
        }
    }

    ChatRequest {
        model: model.to_string(),
        messages: messages.to_vec(),
        stream,
        temperature: options.temperature,
        max_tokens,
        max_completion_tokens,
        tools: (!tools.is_empty())
            .then(|| tools.iter().cloned().map(ToolSchema::from).collect()),
        tool_choice: (!tools.is_empty()).then(|| {
            options
                .tool_choice
                .clone()
                .unwrap_or_else(|| serde_json::Value::String("auto".to_string()))
        }),
        reasoning_effort,
        extra_body,
        thinking,
    }
}

/// Serialize a request and merge the caller's raw overrides.
pub fn to_payload(
    request: &ChatRequest,
    extra: Option<&serde_json::Map<String, serde_json::Value>>,
) -> Result<serde_json::Value, ApiError> {
    let mut payload = serde_json::to_value(request).map_err(|e| ApiError::BadRequest {
        message: format!("Failed to serialize request: {e}"),
    })?;

    if let (Some(object), Some(extra)) = (payload.as_object_mut(), extra) {
        for (key, value) in extra {
            if value.is_null() {
                object.remove(key);
            } else {
                object.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_types::detect;

    fn sample_tools() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "lookup".into(),
            description: "Look something up".into(),
            parameters: serde_json::json!({"type": "object"}),
        }]
    }

    fn payload_for(model: &str, tools: &[ToolDefinition], options: &RequestOptions) -> serde_json::Value {
        let request = build(
            model,
            &[Message::user("hi")],
            tools,
            detect(model),
            options,
            false,
        );
        to_payload(&request, options.extra.as_ref()).unwrap()
    }

    #[test]
    fn plain_model_gets_no_reasoning_block() {
        let options = RequestOptions {
            max_tokens: Some(1024),
            ..Default::default()
        };
        let payload = payload_for("llama-3.1-8b", &[], &options);
        assert_eq!(payload["max_tokens"], 1024);
        assert!(payload.get("reasoning_effort").is_none());
        assert!(payload.get("extra_body").is_none());
        assert!(payload.get("thinking").is_none());
    }

    #[test]
    fn openai_dialect_moves_token_limit() {
        let options = RequestOptions {
            max_tokens: Some(2048),
            effort: ReasoningEffort::High,
            ..Default::default()
        };
        let payload = payload_for("o3-mini", &[], &options);
        assert_eq!(payload["reasoning_effort"], "high");
        assert_eq!(payload["max_completion_tokens"], 2048);
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn thinking_budget_dialect_nests_google_config() {
        let options = RequestOptions {
            effort: ReasoningEffort::Low,
            ..Default::default()
        };
        let payload = payload_for("gemini-2.5-flash", &[], &options);
        let config = &payload["extra_body"]["google"]["thinking_config"];
        assert_eq!(config["thinking_budget"], 4096);
        assert_eq!(config["include_thoughts"], true);
        assert!(payload.get("reasoning_effort").is_none());
    }

    #[test]
    fn enabled_flag_dialect_sets_thinking_type() {
        let payload = payload_for("qwen3-thinking", &[], &RequestOptions::default());
        assert_eq!(payload["thinking"]["type"], "enabled");
    }

    #[test]
    fn tools_and_tool_choice_present_only_with_tools() {
        let without = payload_for("llama-3.1-8b", &[], &RequestOptions::default());
        assert!(without.get("tools").is_none());
        assert!(without.get("tool_choice").is_none());

        let with = payload_for("llama-3.1-8b", &sample_tools(), &RequestOptions::default());
        assert_eq!(with["tools"][0]["type"], "function");
        assert_eq!(with["tools"][0]["function"]["name"], "lookup");
        assert_eq!(with["tool_choice"], "auto");
    }

    #[test]
    fn extra_overrides_set_and_unset_fields() {
        let mut extra = serde_json::Map::new();
        extra.insert("top_p".into(), serde_json::json!(0.9));
        extra.insert("temperature".into(), serde_json::Value::Null);
        let options = RequestOptions {
            temperature: Some(0.7),
            extra: Some(extra),
            ..Default::default()
        };
        let payload = payload_for("llama-3.1-8b", &[], &options);
        assert_eq!(payload["top_p"], 0.9);
        assert!(payload.get("temperature").is_none());
    }

    #[test]
    fn building_twice_is_idempotent() {
        let options = RequestOptions {
            temperature: Some(0.5),
            max_tokens: Some(512),
            ..Default::default()
        };
        let first = payload_for("gpt-5-mini", &sample_tools(), &options);
        let second = payload_for("gpt-5-mini", &sample_tools(), &options);
        assert_eq!(first, second);
    }
}
