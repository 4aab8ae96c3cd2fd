//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(topic: &str, limit: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let limit = limit.unwrap_or(settings.youtube.max_results);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching YouTube...");
    let results = orchestrator.discover(topic, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(items) if items.is_empty() => {
            Output::warning("No videos found.");
        }
        Ok(items) => {
            Output::header(&format!("Found {} videos", items.len()));
            for (i, item) in items.iter().enumerate() {
                Output::video(i + 1, item);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
