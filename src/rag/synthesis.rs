//! Answer synthesis with bounded retry.
//!
//! A model call moves through a small state machine: each attempt either
//! succeeds, backs off and retries after a rate limit, degrades to a fixed
//! message on an oversize payload, or fails.

use super::context::AssembledContext;
use crate::config::Prompts;
use crate::error::{Result, TubechatError};
use crate::llm::{ChatMessage, ChatModel, FailureKind, ModelError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Answer given when nothing relevant was retrieved.
pub const NO_INFORMATION_ANSWER: &str =
    "No relevant information found. Try processing some videos first.";

/// Answer given when the provider rejects the payload as too large.
pub const OVERSIZE_ANSWER: &str =
    "The response was too large. Please try a more specific question or process fewer videos.";

/// Async sleep, injectable so backoff can be observed in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How rate-limited calls are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Retry `n` (0-based) waits `(n + 1) * base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }
}

enum CallState {
    Attempt(u32),
    Success(String),
    Oversize,
    Failed { attempts: u32, error: ModelError },
}

/// Produces answers from assembled context via a chat model.
pub struct AnswerSynthesizer {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts) -> Self {
        Self {
            model,
            prompts,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build the system and user messages for a question.
    pub fn build_messages(&self, question: &str, context: &AssembledContext) -> Vec<ChatMessage> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.render());
        vars.insert("question".to_string(), question.to_string());

        vec![
            ChatMessage::system(self.prompts.rag.system.clone()),
            ChatMessage::user(self.prompts.render_with_custom(&self.prompts.rag.user, &vars)),
        ]
    }

    /// Answer `question` from `context`.
    ///
    /// Empty context returns [`NO_INFORMATION_ANSWER`] without calling the
    /// model. An oversize failure returns [`OVERSIZE_ANSWER`]. Other failures,
    /// including rate limits once retries run out, are errors.
    #[instrument(skip(self, context), fields(blocks = context.blocks().len()))]
    pub async fn synthesize(&self, question: &str, context: &AssembledContext) -> Result<String> {
        if context.is_empty() {
            debug!("No context for question, skipping model call");
            return Ok(NO_INFORMATION_ANSWER.to_string());
        }

        let messages = self.build_messages(question, context);
        let mut state = CallState::Attempt(0);

        loop {
            state = match state {
                CallState::Attempt(n) => match self.model.complete(&messages).await {
                    Ok(answer) => CallState::Success(answer),
                    Err(error) => self.next_state(n, error).await,
                },
                CallState::Success(answer) => return Ok(answer),
                CallState::Oversize => return Ok(OVERSIZE_ANSWER.to_string()),
                CallState::Failed { attempts, error } => {
                    return Err(TubechatError::Synthesis(format!(
                        "{} (after {} attempt{})",
                        error,
                        attempts,
                        if attempts == 1 { "" } else { "s" }
                    )));
                }
            };
        }
    }

    async fn next_state(&self, attempt: u32, error: ModelError) -> CallState {
        match error.kind {
            FailureKind::RateLimited if attempt < self.policy.max_retries => {
                let delay = self.policy.delay_for(attempt);
                warn!("Rate limit hit, retrying in {} seconds", delay.as_secs());
                self.sleeper.sleep(delay).await;
                CallState::Attempt(attempt + 1)
            }
            FailureKind::PayloadTooLarge => {
                warn!("Model rejected payload as too large: {}", error);
                CallState::Oversize
            }
            _ => CallState::Failed {
                attempts: attempt + 1,
                error,
            },
        }
    }
}
