//! Multi-tier TOML configuration for Colloquy.
//!
//! Resolves settings from multiple sources with precedence:
//! caller overrides > env vars > config file > defaults.

use colloquy_mcp::McpConfig;
use colloquy_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The default OpenAI-compatible API base URL, version prefix included.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// The default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// The default bound on consecutive tool-call rounds.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Resolved configuration for a Colloquy session.
#[derive(Debug, Clone)]
pub struct ColloquyConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_tool_iterations: usize,
    pub request_timeout_ms: u64,
    pub mcp: McpConfig,
    pub config_dir: PathBuf,
}

/// Settings that can be read from the TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub mcp: McpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_tool_iterations: Option<usize>,
    pub request_timeout_ms: Option<u64>,
}

/// Programmatic overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
}

impl ColloquyConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. Caller overrides
    /// 2. Environment variables (`COLLOQUY_*`, then `OPENAI_*`)
    /// 3. Config file (~/.colloquy/config.toml)
    /// 4. Defaults
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));

        let api_key = overrides
            .api_key
            .or_else(|| std::env::var("COLLOQUY_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .or(settings.api.api_key)
            .ok_or_else(|| ConfigError::MissingKey {
                key: "api_key (set OPENAI_API_KEY or add to ~/.colloquy/config.toml)".into(),
            })?;

        let model = overrides
            .model
            .or_else(|| std::env::var("COLLOQUY_MODEL").ok())
            .or(settings.api.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = overrides
            .base_url
            .or_else(|| std::env::var("COLLOQUY_BASE_URL").ok())
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .or(settings.api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let max_tokens = overrides.max_tokens.or(settings.api.max_tokens);

        Ok(ColloquyConfig {
            api_key,
            model,
            base_url,
            temperature: settings.api.temperature,
            max_tokens,
            max_tool_iterations: settings
                .api
                .max_tool_iterations
                .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS),
            request_timeout_ms: settings
                .api
                .request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            mcp: settings.mcp,
            config_dir,
        })
    }
}

/// The Colloquy config directory path (~/.colloquy/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("COLLOQUY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".colloquy")
}

/// Load and parse a TOML settings file, falling back to defaults on any error.
fn load_settings_file(path: &std::path::Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
