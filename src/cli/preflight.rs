//! Pre-flight checks before expensive operations.
//!
//! Validates that the API keys an operation needs are configured before
//! starting work that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TubechatError};
use crate::openai::is_api_key_configured;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Searching needs the YouTube key.
    Search,
    /// Ingestion needs the YouTube key and the embeddings key.
    Ingest,
    /// Asking needs the embeddings and chat keys.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Search => {
            check_youtube_key(settings)?;
        }
        Operation::Ingest => {
            check_youtube_key(settings)?;
            check_api_key(&settings.embedding.api_key_env)?;
        }
        Operation::Ask => {
            check_api_key(&settings.embedding.api_key_env)?;
            check_api_key(&settings.llm.api_key_env)?;
        }
    }
    Ok(())
}

fn check_youtube_key(settings: &Settings) -> Result<()> {
    match settings.youtube.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(TubechatError::Config(format!(
            "YouTube API key not set. Set it with: export {}='...' or add youtube.api_key to the config file",
            settings.youtube.api_key_env
        ))),
    }
}

fn check_api_key(env: &str) -> Result<()> {
    if is_api_key_configured(env) {
        Ok(())
    } else {
        Err(TubechatError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            env, env
        )))
    }
}
