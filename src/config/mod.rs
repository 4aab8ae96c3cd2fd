//! Configuration module for tubechat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, HistorySettings, IngestionSettings, LlmSettings,
    PromptSettings, RagSettings, Settings, VectorStoreProvider, VectorStoreSettings,
    YoutubeSettings,
};
