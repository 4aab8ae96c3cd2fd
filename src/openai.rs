//! OpenAI-compatible client construction.
//!
//! Both the chat model and the embedder talk to an OpenAI-style API. The base
//! URL is configurable so any compatible provider (Groq, a local server) can be
//! used, and the API key is read from a configurable environment variable.
//!
//! Clients never retry on their own: a rate-limited call fails straight away
//! so the caller's retry policy decides what happens next.

use crate::error::{Result, TubechatError};
use async_openai::config::{OpenAIConfig, OPENAI_API_BASE};
use async_openai::Client;
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection options for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL; `None` means the official OpenAI API.
    pub api_base: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl ClientOptions {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(OPENAI_API_BASE)
            .trim_end_matches('/')
    }

    /// API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Create a client for the given endpoint.
pub fn create_client(options: &ClientOptions) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| TubechatError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_base(options.base_url());
    if let Some(key) = options.api_key() {
        config = config.with_api_key(key);
    }

    // A zero elapsed-time budget turns off async-openai's internal 429 retries
    let backoff = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(backoff))
}

/// Whether the API key environment variable is set and non-empty.
pub fn is_api_key_configured(api_key_env: &str) -> bool {
    std::env::var(api_key_env).is_ok_and(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_custom_base() {
        let options = ClientOptions {
            api_base: Some("https://api.groq.com/openai/v1".to_string()),
            api_key_env: "TUBECHAT_TEST_UNSET_KEY".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(create_client(&options).is_ok());
        assert!(!is_api_key_configured("TUBECHAT_TEST_UNSET_KEY"));
        assert!(options.api_key().is_none());
    }

    #[test]
    fn test_base_url() {
        let options = ClientOptions {
            api_base: Some("http://localhost:8080/v1/".to_string()),
            ..ClientOptions::default()
        };
        assert_eq!(options.base_url(), "http://localhost:8080/v1");
        assert_eq!(ClientOptions::default().base_url(), "https://api.openai.com/v1");
    }
}
