//! Model capability detection.
//!
//! Maps a model identifier to a capability record by case-insensitive
//! substring matching against known vendor family markers. Total function:
//! unknown models get `{is_reasoning: false, dialect: None}`.

/// The vendor-specific wire format for reasoning configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningDialect {
    /// No reasoning configuration is sent.
    None,
    /// `reasoning_effort` field; token limit moves to `max_completion_tokens`.
    OpenAi,
    /// Nested `extra_body.google.thinking_config` budget object.
    ThinkingBudget,
    /// Nested `thinking: {type: "enabled"}` toggle.
    EnabledFlag,
}

/// Capabilities derived from a model identifier, computed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityRecord {
    pub is_reasoning: bool,
    pub dialect: ReasoningDialect,
}

impl CapabilityRecord {
    pub const NONE: CapabilityRecord = CapabilityRecord {
        is_reasoning: false,
        dialect: ReasoningDialect::None,
    };
}

/// Requested reasoning effort level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReasoningEffort {
    Minimal,
    Low,
    #[default]
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningEffort::Minimal => "minimal",
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }

    /// Fixed thinking-token budget for the budget-style dialect.
    pub fn budget_tokens(self) -> u32 {
        match self {
            ReasoningEffort::Minimal => 2048,
            ReasoningEffort::Low => 4096,
            ReasoningEffort::Medium => 8192,
            ReasoningEffort::High => 16384,
        }
    }
}

/// Budget-dialect families; checked first so e.g. a "-thinking" suffix on a
/// Gemini model still selects the budget object.
const THINKING_BUDGET_FAMILIES: &[&str] = &["gemini-2.5", "gemini-3"];

/// Families configured through `reasoning_effort`.
const OPENAI_STYLE_FAMILIES: &[&str] = &["gpt-5", "o1", "o3", "o4", "grok-3"];

/// Families that reason without any request-side configuration.
const BARE_REASONING_FAMILIES: &[&str] = &["deepseek-r1", "deepseek-reasoner", "-m2"];

/// Detect reasoning capabilities from a model identifier.
pub fn detect(model_id: &str) -> CapabilityRecord {
    let id = model_id.to_ascii_lowercase();
    let matches_any = |families: &[&str]| families.iter().any(|f| id.contains(f));

    if matches_any(THINKING_BUDGET_FAMILIES) {
        return CapabilityRecord {
            is_reasoning: true,
            dialect: ReasoningDialect::ThinkingBudget,
        };
    }
    if matches_any(OPENAI_STYLE_FAMILIES) {
        return CapabilityRecord {
            is_reasoning: true,
            dialect: ReasoningDialect::OpenAi,
        };
    }
    if matches_any(BARE_REASONING_FAMILIES) {
        return CapabilityRecord {
            is_reasoning: true,
            dialect: ReasoningDialect::None,
        };
    }
    if id.contains("thinking") {
        return CapabilityRecord {
            is_reasoning: true,
            dialect: ReasoningDialect::EnabledFlag,
        };
    }
    CapabilityRecord::NONE
}
