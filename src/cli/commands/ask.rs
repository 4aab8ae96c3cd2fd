//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::history::{HistoryLog, QaRecord};
use crate::orchestrator::Orchestrator;
use crate::rag::RagEngine;
use crate::vector_store::IndexedItem;
use anyhow::Result;
use tracing::warn;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    top_k: Option<usize>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }
    if let Some(k) = top_k {
        settings.rag.top_k = k;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let topic = latest_topic(&orchestrator.store().list().await?);
    let engine = orchestrator.engine();

    answer(&orchestrator, &engine, question, topic).await
}

/// Topic of the most recently indexed video.
pub(super) fn latest_topic(items: &[IndexedItem]) -> Option<String> {
    items
        .iter()
        .filter(|item| item.topic.is_some())
        .max_by_key(|item| item.indexed_at)
        .and_then(|item| item.topic.clone())
}

/// Answer one question, print it with its sources and record it in history.
pub(super) async fn answer(
    orchestrator: &Orchestrator,
    engine: &RagEngine,
    question: &str,
    topic: Option<String>,
) -> Result<()> {
    let spinner = Output::spinner("Searching indexed videos...");
    let result = engine
        .ask_with_timeout(question, orchestrator.answer_timeout())
        .await;
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    println!("\n{}\n", response.answer);

    if !response.sources.is_empty() {
        Output::header("Sources");
        for source in &response.sources {
            Output::source(source);
        }
        println!();
    }

    let settings = orchestrator.settings();
    if settings.history.enabled {
        let item_count = orchestrator.store().count().await?;
        let record = QaRecord::new(topic, response.question, response.answer, item_count);
        if let Err(e) = HistoryLog::new(settings.history_path()).append(&record) {
            warn!("Failed to record history: {}", e);
        }
    }

    Ok(())
}
