//! Chat-completions HTTP client.

use std::time::Duration;

use colloquy_types::{ApiError, ChatTransport, EventStream};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::future::Future;
use std::pin::Pin;

use crate::stream::ChatStream;

/// Default per-request deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for OpenAI-compatible chat-completions endpoints.
///
/// The base URL includes the version prefix (e.g. `https://api.openai.com/v1`);
/// the client appends `/chat/completions`. One caller-configurable timeout
/// applies per HTTP exchange, in both buffered and streaming modes. Failures
/// are classified but never retried.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Create a new client.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
                ApiError::Auth {
                    message: "Invalid API key format".into(),
                }
            })?,
        );
        Ok(headers)
    }

    async fn send(&self, payload: &serde_json::Value) -> Result<reqwest::Response, ApiError> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        tracing::debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &body))
    }

    /// Send a buffered request and return the full JSON response body.
    pub async fn chat(&self, payload: &serde_json::Value) -> Result<serde_json::Value, ApiError> {
        let response = self.send(payload).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Send a streaming request and return the decoded event stream.
    pub async fn chat_stream(&self, payload: &serde_json::Value) -> Result<ChatStream, ApiError> {
        let response = self.send(payload).await?;
        Ok(ChatStream::new(response.bytes_stream()))
    }
}

impl ChatTransport for OpenAiClient {
    fn chat<'a>(
        &'a self,
        payload: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ApiError>> + Send + 'a>> {
        Box::pin(self.chat(payload))
    }

    fn chat_stream<'a>(
        &'a self,
        payload: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let stream = self.chat_stream(payload).await?;
            Ok(Box::pin(stream) as EventStream)
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Classify an HTTP error response into a typed ApiError.
fn classify_error(status: u16, body: &str) -> ApiError {
    // Try to parse as a JSON error envelope
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => ApiError::Auth { message },
        400 => ApiError::BadRequest { message },
        429 => ApiError::RateLimited { message },
        _ => ApiError::Server { status, message },
    }
}
