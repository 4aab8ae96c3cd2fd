//! History command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::history::HistoryLog;
use anyhow::Result;
use console::style;

/// Run the history command.
pub fn run_history(limit: usize, settings: Settings) -> Result<()> {
    let log = HistoryLog::new(settings.history_path());
    let records = log.recent(limit)?;

    if records.is_empty() {
        Output::info("No questions asked yet.");
        return Ok(());
    }

    Output::header(&format!("Recent Questions ({})", records.len()));
    for record in &records {
        println!(
            "\n{} {} {}",
            style(record.timestamp.format("%Y-%m-%d %H:%M")).dim(),
            style(record.topic.as_deref().unwrap_or("-")).cyan(),
            style(&record.question).bold()
        );
        println!("   {}", record.answer.replace('\n', "\n   "));
    }

    Ok(())
}
