//! CLI output formatting utilities.

use crate::discovery::ContentItem;
use crate::orchestrator::ItemOutcome;
use crate::rag::ContextBlock;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a discovered video.
    pub fn video(index: usize, item: &ContentItem) {
        println!("{:>3}. {}", index, style(&item.title).bold());
        println!("     Channel: {}", item.source);
        println!("     {}", style(item.url()).dim());
    }

    /// Print an indexed video.
    pub fn indexed_item(title: &str, id: &str, topic: Option<&str>, chars: usize) {
        println!(
            "  {} {} ({}, {}, {} chars)",
            style("*").cyan(),
            style(title).bold(),
            style(id).dim(),
            topic.unwrap_or("no topic"),
            chars
        );
    }

    /// Print the outcome of ingesting one video.
    pub fn item_outcome(item: &ContentItem, outcome: &ItemOutcome) {
        let (mark, note) = match outcome {
            ItemOutcome::Indexed => (style("✓").green(), "indexed".to_string()),
            ItemOutcome::AlreadyPresent => (style("✓").green(), "already in database".to_string()),
            ItemOutcome::NoTranscript => (style("✗").yellow(), "no transcript available".to_string()),
            ItemOutcome::Failed(reason) => (style("✗").red(), format!("failed: {}", reason)),
        };
        println!("  {} {} ({})", mark, item.title, style(note).dim());
    }

    /// Print an answer source.
    pub fn source(block: &ContextBlock) {
        println!(
            "\n{} {} by {} (score: {:.2})",
            style(">>").green(),
            style(&block.title).bold(),
            block.source,
            block.relevance
        );
        println!("   {}", content_preview(&block.excerpt, 200));
        println!("   {}", style(&block.url).dim());
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        if let Ok(template) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(template.progress_chars("#>-"));
        }
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten newlines and cut to `max_chars` characters with an ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &content[..end]),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview_counts_chars() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("ééééé", 3), "ééé...");
    }
}
