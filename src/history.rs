//! Q&A history.
//!
//! Answered questions are appended as JSON lines. Values under sensitive keys
//! are redacted before anything is written or logged.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Replacement for redacted values.
pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_KEYS: &[&str] = &["api_key", "key", "password", "token"];

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    /// Most recently ingested topic, if any.
    pub topic: Option<String>,
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    /// Items indexed when the question was asked.
    pub item_count: usize,
}

impl QaRecord {
    pub fn new(
        topic: Option<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        item_count: usize,
    ) -> Self {
        Self {
            topic,
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
            item_count,
        }
    }

    /// The record as JSON with sensitive fields redacted.
    pub fn to_redacted_json(&self) -> Result<Value> {
        Ok(redact(serde_json::to_value(self)?))
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// Replace every value whose key looks sensitive, at any depth.
pub fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    if is_sensitive(&k) {
                        (k, Value::String(REDACTED.to_string()))
                    } else {
                        (k, redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}

/// Append-only JSON lines log of answered questions.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record, creating the file and its directory if needed.
    pub fn append(&self, record: &QaRecord) -> Result<()> {
        let value = record.to_redacted_json()?;
        info!(
            topic = record.topic.as_deref().unwrap_or("-"),
            items = record.item_count,
            "Answered question: {}",
            record.question
        );

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&value)?)?;
        Ok(())
    }

    /// Up to `limit` most recent records, oldest first.
    ///
    /// Lines that fail to parse are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<QaRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(std::fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<QaRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed history line {}: {}", n + 1, e),
            }
        }

        let skip = records.len().saturating_sub(limit);
        Ok(records.split_off(skip))
    }
}
