//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.store().list().await {
        Ok(items) => {
            if items.is_empty() {
                Output::info("No videos indexed yet. Use 'tubechat ingest <topic>' to add content.");
            } else {
                Output::header(&format!("Indexed Videos ({})", items.len()));
                println!();

                for item in &items {
                    Output::indexed_item(
                        &item.title,
                        &item.item_id,
                        item.topic.as_deref(),
                        item.document_chars,
                    );
                }

                let mut topics: Vec<_> = items.iter().filter_map(|i| i.topic.as_deref()).collect();
                topics.sort_unstable();
                topics.dedup();
                println!();
                Output::kv("Total videos", &items.len().to_string());
                Output::kv("Topics", &topics.join(", "));
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
