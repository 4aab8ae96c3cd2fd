//! CLI module for tubechat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// tubechat - Ask questions about YouTube videos
///
/// Searches YouTube for a topic, indexes the transcripts of the videos it finds
/// and answers questions using only what those videos say.
#[derive(Parser, Debug)]
#[command(name = "tubechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search YouTube for videos about a topic
    Search {
        /// Topic to search for
        topic: String,

        /// Maximum number of videos (1-20)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Search for a topic and index the transcripts of the videos found
    Ingest {
        /// Topic to ingest
        topic: String,

        /// Maximum number of videos (1-20)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Ask a question and get an answer from the indexed videos
    Ask {
        /// The question to ask
        question: String,

        /// Number of transcripts to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Chat model to use for the answer
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive session
    Chat {
        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List indexed videos
    List,

    /// Remove a video from the index
    Forget {
        /// Video ID to remove
        item_id: String,
    },

    /// Show recent questions and answers
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_ask_with_options() {
        let cli = Cli::parse_from(["tubechat", "-vv", "ask", "Why do cats purr?", "-k", "5"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question, top_k, model } => {
                assert_eq!(question, "Why do cats purr?");
                assert_eq!(top_k, Some(5));
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parses_config_init() {
        let cli = Cli::parse_from(["tubechat", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
