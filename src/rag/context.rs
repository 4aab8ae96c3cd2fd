//! Context assembly for answer prompts.
//!
//! Retrieved chunks are cut to a per-chunk size and taken greedily, in
//! relevance order, until the total excerpt budget would be exceeded.

use crate::chunking::HeadChunker;
use crate::discovery::watch_url;
use crate::store::QueryResult;
use tracing::debug;

/// Default total excerpt budget per prompt, in characters.
pub const DEFAULT_CONTEXT_BUDGET_CHARS: usize = 4000;

/// One retrieved excerpt with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBlock {
    pub item_id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub excerpt: String,
    pub relevance: f32,
}

impl ContextBlock {
    /// Excerpt length in characters.
    pub fn excerpt_chars(&self) -> usize {
        self.excerpt.chars().count()
    }

    fn render(&self) -> String {
        format!(
            "Source: '{}' by {}\nURL: {}\nKey Points:\n{}\n---",
            self.title, self.source, self.url, self.excerpt
        )
    }
}

/// Context for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembledContext {
    /// Nothing relevant was retrieved.
    Empty,
    /// Non-empty excerpts in relevance order.
    Populated(Vec<ContextBlock>),
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        matches!(self, AssembledContext::Empty)
    }

    pub fn blocks(&self) -> &[ContextBlock] {
        match self {
            AssembledContext::Empty => &[],
            AssembledContext::Populated(blocks) => blocks,
        }
    }

    /// Sum of excerpt lengths in characters.
    pub fn total_chars(&self) -> usize {
        self.blocks().iter().map(ContextBlock::excerpt_chars).sum()
    }

    /// Render the blocks as prompt text.
    pub fn render(&self) -> String {
        self.blocks()
            .iter()
            .map(ContextBlock::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builds budgeted prompt context from query results.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    chunker: HeadChunker,
    budget_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self {
            chunker: HeadChunker::default(),
            budget_chars: DEFAULT_CONTEXT_BUDGET_CHARS,
        }
    }
}

impl ContextAssembler {
    pub fn new(chunk_chars: usize, budget_chars: usize) -> Self {
        Self {
            chunker: HeadChunker::new(chunk_chars),
            budget_chars,
        }
    }

    /// Turn query results into context.
    ///
    /// Results are taken in the order given. The first result whose excerpt
    /// would bring the total to or past the budget ends assembly; it and
    /// everything after it are dropped.
    pub fn assemble(&self, results: &QueryResult) -> AssembledContext {
        let mut blocks = Vec::new();
        let mut total_chars = 0;

        for hit in results.hits() {
            let excerpt = self.chunker.chunk(&hit.document);
            let excerpt_chars = excerpt.chars().count();

            if total_chars + excerpt_chars >= self.budget_chars {
                debug!(
                    "Context budget of {} reached, dropping {} lower-ranked results",
                    self.budget_chars,
                    results.len() - blocks.len()
                );
                break;
            }
            total_chars += excerpt_chars;

            blocks.push(ContextBlock {
                item_id: hit.metadata.item_id.clone(),
                title: hit.metadata.title.clone(),
                source: hit.metadata.source.clone(),
                url: watch_url(&hit.metadata.item_id),
                excerpt,
                relevance: hit.relevance,
            });
        }

        if blocks.is_empty() {
            AssembledContext::Empty
        } else {
            AssembledContext::Populated(blocks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::QueryHit;
    use crate::vector_store::ChunkMetadata;

    fn hit(id: &str, document: String, relevance: f32) -> QueryHit {
        QueryHit {
            document,
            metadata: ChunkMetadata {
                title: format!("Video {}", id),
                source: "Channel".to_string(),
                item_id: id.to_string(),
                topic: None,
            },
            relevance,
        }
    }

    #[test]
    fn test_empty_results_give_empty_marker() {
        let context = ContextAssembler::default().assemble(&QueryResult::default());
        assert!(context.is_empty());
        assert_eq!(context, AssembledContext::Empty);
        assert_eq!(context.render(), "");
    }

    #[test]
    fn test_blocks_carry_provenance() {
        let results = QueryResult::new(vec![hit("abc", "Cats purr.".to_string(), 0.9)]);
        let context = ContextAssembler::default().assemble(&results);

        let block = &context.blocks()[0];
        assert_eq!(block.url, "https://youtube.com/watch?v=abc");
        assert_eq!(
            context.render(),
            "Source: 'Video abc' by Channel\nURL: https://youtube.com/watch?v=abc\nKey Points:\nCats purr.\n---"
        );
    }

    #[test]
    fn test_chunks_long_documents() {
        let long = "Sentence number one is here. ".repeat(100);
        let results = QueryResult::new(vec![hit("a", long, 0.9)]);
        let context = ContextAssembler::default().assemble(&results);
        assert!(context.blocks()[0].excerpt_chars() <= 1000);
        assert!(context.blocks()[0].excerpt.ends_with('.'));
    }

    #[test]
    fn test_budget_drops_lower_ranked_suffix() {
        let results = QueryResult::new(vec![
            hit("a", "a".repeat(400), 0.9),
            hit("b", "b".repeat(400), 0.8),
            hit("c", "c".repeat(400), 0.7),
            hit("d", "d".repeat(10), 0.6),
        ]);

        // 303 chars per truncated block: two fit in 700. "d" would still fit
        // but comes after the block that ended assembly.
        let context = ContextAssembler::new(300, 700).assemble(&results);
        let ids: Vec<_> = context.blocks().iter().map(|b| b.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(context.total_chars(), 606);
    }

    #[test]
    fn test_budget_is_never_exceeded_and_output_is_prefix() {
        let sizes = [5usize, 900, 1200, 30, 700, 1, 2500, 999];
        for budget in [0usize, 1, 10, 500, 1000, 2000, 4000] {
            let hits: Vec<_> = sizes
                .iter()
                .enumerate()
                .map(|(i, n)| hit(&i.to_string(), "x. ".repeat(*n), 1.0 - i as f32 / 10.0))
                .collect();
            let results = QueryResult::new(hits);
            let context = ContextAssembler::new(1000, budget).assemble(&results);

            assert!(context.is_empty() || context.total_chars() < budget);
            for (i, block) in context.blocks().iter().enumerate() {
                assert_eq!(block.item_id, i.to_string());
            }
        }
    }

    #[test]
    fn test_nothing_fitting_is_empty() {
        let results = QueryResult::new(vec![hit("a", "a".repeat(50), 0.9)]);
        assert!(ContextAssembler::new(1000, 10).assemble(&results).is_empty());
    }

    #[test]
    fn test_excerpt_reaching_budget_exactly_is_dropped() {
        let results = QueryResult::new(vec![hit("a", "a".repeat(10), 0.9)]);
        assert!(ContextAssembler::new(1000, 10).assemble(&results).is_empty());

        let results = QueryResult::new(vec![
            hit("a", "a".repeat(6), 0.9),
            hit("b", "b".repeat(4), 0.8),
        ]);
        let context = ContextAssembler::new(1000, 10).assemble(&results);
        assert_eq!(context.blocks().len(), 1);
        assert_eq!(context.total_chars(), 6);
    }
}
