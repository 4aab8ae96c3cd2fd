//! tubechat - Ask questions about YouTube videos
//!
//! Searches YouTube for a topic, indexes the transcripts of the videos found and
//! answers questions strictly from that material.
//!
//! # Overview
//!
//! tubechat allows you to:
//! - Discover videos about a topic with the YouTube Data API
//! - Index their transcripts in a similarity-searchable store
//! - Ask questions and get answers that cite the videos they came from
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `validation` - Free-text input sanitizing
//! - `discovery` - Video search
//! - `transcript` - Caption extraction
//! - `chunking` - Sentence-aware head truncation
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `store` - Idempotent upsert and query over transcripts
//! - `llm` - Chat model abstraction with failure classification
//! - `rag` - Context assembly and answer synthesis
//! - `history` - Q&A history with redaction
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use tubechat::config::Settings;
//! use tubechat::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let summary = orchestrator.ingest_topic("home espresso", 10).await?;
//!     println!("Indexed {} videos", summary.indexed);
//!
//!     let response = orchestrator.engine().ask("How fine should I grind?").await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod embedding;
pub mod error;
pub mod history;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod store;
pub mod transcript;
pub mod validation;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{Result, TubechatError};
