//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{IngestSummary, Orchestrator};
use crate::validation::{validate_input, DEFAULT_MAX_INPUT_LENGTH};
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(topic: &str, limit: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    ingest_topic(&orchestrator, topic, limit).await?;
    Ok(())
}

/// Discover and ingest a topic, reporting progress per video.
pub(super) async fn ingest_topic(
    orchestrator: &Orchestrator,
    topic: &str,
    limit: Option<usize>,
) -> Result<IngestSummary> {
    let topic = validate_input(topic, DEFAULT_MAX_INPUT_LENGTH)?;
    let limit = limit.unwrap_or(orchestrator.settings().youtube.max_results);

    let spinner = Output::spinner(&format!("Searching for videos about '{}'...", topic));
    let items = orchestrator.discover(&topic, limit).await;
    spinner.finish_and_clear();
    let items = items?;

    if items.is_empty() {
        Output::warning("No videos found.");
        return Ok(IngestSummary {
            topic,
            ..IngestSummary::default()
        });
    }

    Output::header(&format!("Found {} videos", items.len()));
    for (i, item) in items.iter().enumerate() {
        Output::video(i + 1, item);
    }

    Output::header("Processing videos");
    let progress = Output::progress_bar(items.len() as u64, "Fetching transcripts");
    let summary = orchestrator
        .ingest_items(&topic, items, |item, outcome| {
            progress.suspend(|| Output::item_outcome(item, outcome));
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    println!();
    Output::kv("Indexed", &summary.indexed.to_string());
    Output::kv("Already in database", &summary.already_present.to_string());
    Output::kv("No transcript", &summary.no_transcript.to_string());
    if summary.failed > 0 {
        Output::kv("Failed", &summary.failed.to_string());
    }

    if summary.available() > 0 {
        Output::success(&format!(
            "{} videos about '{}' ready for questions",
            summary.available(),
            topic
        ));
    } else {
        Output::warning("No transcripts could be indexed for this topic.");
    }

    Ok(summary)
}
