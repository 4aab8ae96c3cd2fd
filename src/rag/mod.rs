//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieval goes through the [`ContentStore`](crate::store::ContentStore),
//! [`context`] bounds what reaches the prompt and [`synthesis`] calls the model.

pub mod context;
mod response;
pub mod synthesis;

pub use context::{AssembledContext, ContextAssembler, ContextBlock};
pub use response::{RagEngine, RagResponse};
pub use synthesis::{AnswerSynthesizer, RetryPolicy, Sleeper, TokioSleeper};
