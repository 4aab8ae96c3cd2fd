//! Question answering over the content store.

use super::context::{AssembledContext, ContextAssembler, ContextBlock};
use super::synthesis::AnswerSynthesizer;
use crate::error::{Result, TubechatError};
use crate::store::{ContentStore, DEFAULT_TOP_K};
use crate::validation::{validate_input, DEFAULT_MAX_INPUT_LENGTH};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Retrieves, assembles and synthesizes an answer for one question.
pub struct RagEngine {
    store: ContentStore,
    assembler: ContextAssembler,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl RagEngine {
    pub fn new(store: ContentStore, assembler: ContextAssembler, synthesizer: AnswerSynthesizer) -> Self {
        Self {
            store,
            assembler,
            synthesizer,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set how many chunks are retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Retrieve and assemble context for a question without calling the model.
    pub async fn context_for(&self, question: &str) -> Result<AssembledContext> {
        let results = self.store.query(question, self.top_k).await?;
        Ok(self.assembler.assemble(&results))
    }

    /// Answer a question from the indexed transcripts.
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        let question = validate_input(question, DEFAULT_MAX_INPUT_LENGTH)?;
        info!("Processing question: {}", question);

        let context = self.context_for(&question).await?;
        let answer = self.synthesizer.synthesize(&question, &context).await?;

        debug!("Generated response with {} sources", context.blocks().len());

        Ok(RagResponse {
            question,
            answer,
            sources: context.blocks().to_vec(),
        })
    }

    /// [`ask`](Self::ask) bounded by a deadline covering retrieval, retries and
    /// backoff.
    pub async fn ask_with_timeout(&self, question: &str, deadline: Duration) -> Result<RagResponse> {
        tokio::time::timeout(deadline, self.ask(question))
            .await
            .map_err(|_| TubechatError::Timeout(deadline.as_secs()))?
    }
}

/// An answer with the excerpts it was built from.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The question as validated and actually answered.
    pub question: String,
    pub answer: String,
    pub sources: Vec<ContextBlock>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n'{}' by {} (score: {:.2})\n  {}",
                    source.title, source.source, source.relevance, source.url
                ));
            }
        }

        output
    }
}
