//! Pipeline orchestrator for tubechat.
//!
//! Builds every service from [`Settings`] and coordinates topic ingestion:
//! discovery, then transcript extraction, chunking and upsert for each video.

use crate::chunking::HeadChunker;
use crate::config::{Prompts, Settings, VectorStoreProvider};
use crate::discovery::{ContentDiscovery, ContentItem, SearchProvider, YoutubeSearch};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubechatError};
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::rag::{AnswerSynthesizer, ContextAssembler, RagEngine, RetryPolicy};
use crate::store::ContentStore;
use crate::transcript::{TranscriptExtractor, TranscriptProvider, YoutubeTranscripts};
use crate::validation::{validate_input, DEFAULT_MAX_INPUT_LENGTH};
use crate::vector_store::{
    ChunkMetadata, MemoryVectorStore, SqliteVectorStore, UpsertOutcome, VectorStore,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// The main orchestrator for the tubechat pipeline.
pub struct Orchestrator {
    settings: Settings,
    discovery: Option<ContentDiscovery>,
    extractor: TranscriptExtractor,
    chunker: HeadChunker,
    store: ContentStore,
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl Orchestrator {
    /// Create an orchestrator backed by YouTube and an OpenAI-compatible API.
    ///
    /// A missing YouTube key is not an error here; only [`discover`](Self::discover)
    /// and ingestion need it.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let search: Option<Arc<dyn SearchProvider>> = match settings.youtube.resolve_api_key() {
            Some(key) => Some(Arc::new(YoutubeSearch::new(key)?)),
            None => {
                debug!("No YouTube API key configured, discovery disabled");
                None
            }
        };

        let transcripts = Arc::new(YoutubeTranscripts::new(
            settings.youtube.transcript_language.clone(),
        )?);

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.client_options(),
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);

        let vectors: Arc<dyn VectorStore> = match settings.vector_store.provider {
            VectorStoreProvider::Sqlite => {
                let path = settings.sqlite_path();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Arc::new(SqliteVectorStore::new(&path)?)
            }
            VectorStoreProvider::Memory => {
                info!("Using in-memory vector store; nothing will persist");
                Arc::new(MemoryVectorStore::new())
            }
        };

        let model = Arc::new(OpenAIChatModel::new(
            &settings.llm.client_options(),
            &settings.llm.model,
            settings.llm.temperature,
        )?);

        let mut orchestrator =
            Self::with_components(settings, transcripts, embedder, vectors, model, prompts);
        orchestrator.discovery = search.map(ContentDiscovery::new);
        Ok(orchestrator)
    }

    /// Create an orchestrator from explicit components.
    ///
    /// Discovery stays disabled until a search provider is attached with
    /// [`with_search`](Self::with_search).
    pub fn with_components(
        settings: Settings,
        transcripts: Arc<dyn TranscriptProvider>,
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
        prompts: Prompts,
    ) -> Self {
        let store = ContentStore::new(vectors, embedder).with_min_score(settings.rag.min_score);
        let chunker = HeadChunker::new(settings.ingestion.chunk_chars);

        Self {
            settings,
            discovery: None,
            extractor: TranscriptExtractor::new(transcripts),
            chunker,
            store,
            model,
            prompts,
        }
    }

    /// Attach a search provider.
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.discovery = Some(ContentDiscovery::new(search));
        self
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the content store.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Build a question-answering engine over the content store.
    pub fn engine(&self) -> RagEngine {
        let rag = &self.settings.rag;
        let policy = RetryPolicy {
            max_retries: self.settings.llm.max_retries,
            base_delay: Duration::from_secs(self.settings.llm.retry_base_delay_secs),
        };

        let synthesizer =
            AnswerSynthesizer::new(self.model.clone(), self.prompts.clone()).with_retry_policy(policy);

        RagEngine::new(
            self.store.clone(),
            ContextAssembler::new(rag.chunk_chars, rag.context_budget_chars),
            synthesizer,
        )
        .with_top_k(rag.top_k)
    }

    /// Answer deadline from settings.
    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.llm.timeout_secs)
    }

    /// Discover videos for a topic.
    pub async fn discover(&self, topic: &str, max_results: usize) -> Result<Vec<ContentItem>> {
        let discovery = self.discovery.as_ref().ok_or_else(|| {
            TubechatError::Config(format!(
                "YouTube API key not configured. Set {} or youtube.api_key in the config file.",
                self.settings.youtube.api_key_env
            ))
        })?;
        discovery.discover(topic, max_results).await
    }

    /// Discover and ingest videos for a topic.
    #[instrument(skip(self))]
    pub async fn ingest_topic(&self, topic: &str, max_results: usize) -> Result<IngestSummary> {
        let topic = validate_input(topic, DEFAULT_MAX_INPUT_LENGTH)?;
        let items = self.discover(&topic, max_results).await?;
        Ok(self.ingest_items(&topic, items, |_, _| {}).await)
    }

    /// Ingest already-discovered items under `topic`.
    ///
    /// Items are processed concurrently, bounded by `ingestion.max_concurrent`.
    /// One item failing never stops the others. `on_item` is called as each
    /// item completes, in completion order.
    pub async fn ingest_items<F>(
        &self,
        topic: &str,
        items: Vec<ContentItem>,
        mut on_item: F,
    ) -> IngestSummary
    where
        F: FnMut(&ContentItem, &ItemOutcome),
    {
        let mut summary = IngestSummary {
            topic: topic.to_string(),
            discovered: items.len(),
            ..IngestSummary::default()
        };

        let concurrency = self.settings.ingestion.max_concurrent.max(1);
        let mut results = stream::iter(items)
            .map(|item| async move {
                let outcome = self.ingest_item(topic, &item).await;
                (item, outcome)
            })
            .buffer_unordered(concurrency);

        while let Some((item, outcome)) = results.next().await {
            on_item(&item, &outcome);
            summary.record(&outcome);
        }

        info!(
            "Ingested topic '{}': {} indexed, {} already present, {} without transcript, {} failed",
            topic,
            summary.indexed,
            summary.already_present,
            summary.no_transcript,
            summary.failed
        );
        summary
    }

    /// Extract, chunk and store one item.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn ingest_item(&self, topic: &str, item: &ContentItem) -> ItemOutcome {
        let record = self.extractor.extract_record(item).await;
        if record.is_empty() {
            return ItemOutcome::NoTranscript;
        }

        let document = self.chunker.chunk(&record.text);
        let metadata = ChunkMetadata {
            title: item.title.clone(),
            source: item.source.clone(),
            item_id: item.id.clone(),
            topic: Some(topic.to_string()),
        };

        match self.store.upsert(&item.id, &document, metadata).await {
            Ok(UpsertOutcome::Inserted) => ItemOutcome::Indexed,
            Ok(UpsertOutcome::AlreadyPresent) => ItemOutcome::AlreadyPresent,
            Err(e) => {
                warn!("Failed to index {}: {}", item.id, e);
                ItemOutcome::Failed(e.to_string())
            }
        }
    }
}

/// What happened to one item during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Indexed,
    AlreadyPresent,
    NoTranscript,
    Failed(String),
}

/// Totals for one topic ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestSummary {
    pub topic: String,
    pub discovered: usize,
    pub indexed: usize,
    pub already_present: usize,
    pub no_transcript: usize,
    pub failed: usize,
}

impl IngestSummary {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Indexed => self.indexed += 1,
            ItemOutcome::AlreadyPresent => self.already_present += 1,
            ItemOutcome::NoTranscript => self.no_transcript += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Items now available for questions.
    pub fn available(&self) -> usize {
        self.indexed + self.already_present
    }
}
