//! Interactive session command.
//!
//! `topic <name>` ingests videos for a topic; anything else is a question.
//! Each question is answered independently from the current index.

use super::ask::{answer, latest_topic};
use super::ingest::ingest_topic;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line of user input in the session.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Topic(&'a str),
    Question(&'a str),
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Some(Input::Exit);
    }
    match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) if cmd.eq_ignore_ascii_case("topic") => Some(Input::Topic(rest.trim())),
        _ => Some(Input::Question(line)),
    }
}

/// Run the interactive session.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.engine();
    let mut topic = latest_topic(&orchestrator.store().list().await?);

    println!("\n{}", style("tubechat").bold().cyan());
    println!(
        "{}\n",
        style("Type 'topic <name>' to index videos, ask a question, or 'exit' to quit.").dim()
    );
    if let Some(t) = &topic {
        Output::kv("Current topic", t);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            None => continue,
            Some(Input::Exit) => {
                Output::info("Goodbye!");
                break;
            }
            Some(Input::Topic(name)) => {
                if preflight::check(Operation::Ingest, orchestrator.settings()).is_err() {
                    Output::error("A YouTube API key is needed to index new topics.");
                    continue;
                }
                match ingest_topic(&orchestrator, name, None).await {
                    Ok(summary) if summary.available() > 0 => topic = Some(summary.topic),
                    Ok(_) => {}
                    Err(e) => Output::error(&format!("{}", e)),
                }
            }
            Some(Input::Question(question)) => {
                // Errors are already reported by `answer`
                let _ = answer(&orchestrator, &engine, question, topic.clone()).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   \n"), None);
        assert_eq!(parse_input("EXIT\n"), Some(Input::Exit));
        assert_eq!(parse_input("topic  home espresso \n"), Some(Input::Topic("home espresso")));
        assert_eq!(
            parse_input("topical question?"),
            Some(Input::Question("topical question?"))
        );
        assert_eq!(parse_input("topic"), Some(Input::Question("topic")));
    }
}
