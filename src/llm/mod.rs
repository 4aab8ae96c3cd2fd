//! Language model abstraction for answer synthesis.
//!
//! Model adapters report failures as a [`ModelError`] carrying an explicit
//! [`FailureKind`], which drives the synthesizer's retry decisions.

mod openai;

pub use openai::OpenAIChatModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Classification of a model failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider rate limit; worth retrying after a pause.
    RateLimited,
    /// Request or response payload too large (HTTP 413); never retried.
    PayloadTooLarge,
    /// Anything else.
    Other,
}

impl FailureKind {
    /// Classify a failure from its message alone.
    ///
    /// Fallback for providers that expose no structured error codes.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("rate_limit") {
            FailureKind::RateLimited
        } else if message.contains("413") {
            FailureKind::PayloadTooLarge
        } else {
            FailureKind::Other
        }
    }
}

/// A failed model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError {
    pub kind: FailureKind,
    pub message: String,
}

impl ModelError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error classified by [`FailureKind::from_message`].
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: FailureKind::from_message(&message),
            message,
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ModelError {}

/// Trait for chat completion models.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `messages` and return the assistant's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_by_message() {
        assert_eq!(
            FailureKind::from_message("Error code: 429 - rate_limit_exceeded"),
            FailureKind::RateLimited
        );
        assert_eq!(
            FailureKind::from_message("Rate_Limit reached for model"),
            FailureKind::RateLimited
        );
        assert_eq!(
            FailureKind::from_message("HTTP status 413 Payload Too Large"),
            FailureKind::PayloadTooLarge
        );
        assert_eq!(FailureKind::from_message("connection reset"), FailureKind::Other);
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").content, "u");
        assert_eq!(ModelError::from_message("413").kind, FailureKind::PayloadTooLarge);
    }
}
