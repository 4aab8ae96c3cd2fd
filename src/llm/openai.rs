//! OpenAI-compatible chat model adapter.
//!
//! Calls `/chat/completions` with reqwest directly so that the HTTP status is
//! still available when a failure is classified.

use super::{ChatMessage, ChatModel, FailureKind, ModelError};
use crate::error::{Result, TubechatError};
use crate::openai::ClientOptions;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

/// Chat model backed by an OpenAI-compatible chat completions API.
pub struct OpenAIChatModel {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn new(options: &ClientOptions, model: &str, temperature: f32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| TubechatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", options.base_url()),
            api_key: options.api_key(),
            model: model.to_string(),
            temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    /// Some providers send numeric codes.
    #[serde(default)]
    code: Option<Value>,
}

impl ErrorDetail {
    fn code_text(&self) -> String {
        match &self.code {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Map a failed response onto a [`FailureKind`].
///
/// The HTTP status wins, so a 413 carrying a `rate_limit_exceeded` code (as
/// Groq sends for oversized requests) is never retried. Structured codes come
/// next and the message text is only inspected last.
fn classify(status: StatusCode, detail: &ErrorDetail) -> FailureKind {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => return FailureKind::PayloadTooLarge,
        StatusCode::TOO_MANY_REQUESTS => return FailureKind::RateLimited,
        _ => {}
    }

    let code = detail.code_text();
    let kind = detail.kind.as_deref().unwrap_or_default();
    if code.contains("request_too_large") || kind.contains("request_too_large") {
        return FailureKind::PayloadTooLarge;
    }
    if code.contains("rate_limit") || kind.contains("rate_limit") {
        return FailureKind::RateLimited;
    }
    FailureKind::from_message(&detail.message)
}

fn error_from_response(status: StatusCode, body: &str) -> ModelError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| ErrorDetail {
            message: body.trim().to_string(),
            ..ErrorDetail::default()
        });

    let kind = classify(status, &detail);
    warn!(status = status.as_u16(), ?kind, "Chat completion failed");
    ModelError::new(kind, format!("API returned {}: {}", status, detail.message))
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, ModelError> {
        let mut request = self.http.post(&self.endpoint).json(&json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::from_message(format!("Chat request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::from_message(format!("Failed to read chat response: {}", e)))?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            ModelError::new(FailureKind::Other, format!("Invalid chat response: {}", e))
        })?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::new(FailureKind::Other, "Empty response from model"))?;

        debug!("Model returned {} characters", answer.chars().count());
        Ok(answer)
    }
}
