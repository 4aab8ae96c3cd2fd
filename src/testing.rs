//! In-process fakes for the external collaborators, shared by unit tests.

use crate::discovery::{ContentItem, SearchProvider};
use crate::embedding::Embedder;
use crate::error::{Result, TubechatError};
use crate::llm::{ChatMessage, ChatModel, ModelError};
use crate::rag::Sleeper;
use crate::transcript::{TranscriptProvider, TranscriptSegment};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const FAKE_DIMENSIONS: usize = 256;

/// Bag-of-words embedder: each lowercase word is hashed into a bucket.
pub struct FakeEmbedder {
    fail_on: Option<String>,
    embedded: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            fail_on: None,
            embedded: Mutex::new(Vec::new()),
        }
    }

    /// Fail whenever the text contains `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            embedded: Mutex::new(Vec::new()),
        }
    }

    pub fn embedded_texts(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; FAKE_DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() as usize) % FAKE_DIMENSIONS] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail_on.as_deref().is_some_and(|n| text.contains(n)) {
            return Err(TubechatError::Embedding("embedding service unavailable".to_string()));
        }
        self.embedded.lock().unwrap().push(text.to_string());
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        FAKE_DIMENSIONS
    }
}

/// Search provider returning a fixed list.
pub struct StaticSearch {
    items: Option<Vec<ContentItem>>,
    limits: Mutex<Vec<usize>>,
}

impl StaticSearch {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self {
            items: Some(items),
            limits: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            items: None,
            limits: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<ContentItem>> {
        self.limits.lock().unwrap().push(max_results);
        match &self.items {
            Some(items) => Ok(items.iter().take(max_results).cloned().collect()),
            None => Err(TubechatError::Discovery("quota exceeded".to_string())),
        }
    }
}

/// Transcript provider backed by a map; unknown ids have no transcript.
#[derive(Default)]
pub struct StaticTranscripts {
    segments: HashMap<String, Vec<TranscriptSegment>>,
}

impl StaticTranscripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segments(mut self, item_id: &str, segments: Vec<TranscriptSegment>) -> Self {
        self.segments.insert(item_id.to_string(), segments);
        self
    }

    pub fn with_text(self, item_id: &str, text: &str) -> Self {
        self.with_segments(item_id, vec![TranscriptSegment::new(text, 0.0, 1.0)])
    }
}

#[async_trait]
impl TranscriptProvider for StaticTranscripts {
    async fn fetch_segments(&self, item_id: &str) -> Result<Vec<TranscriptSegment>> {
        self.segments
            .get(item_id)
            .cloned()
            .ok_or_else(|| TubechatError::TranscriptNotFound(item_id.to_string()))
    }
}

/// Chat model that replays scripted responses in order.
pub struct ScriptedModel {
    script: Mutex<VecDeque<std::result::Result<String, ModelError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<std::result::Result<String, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(answer: &str) -> Self {
        Self::new(vec![Ok(answer.to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, ModelError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::from_message("script exhausted")))
    }
}

/// Sleeper that records requested delays instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Chat model that answers only after `delay`.
pub struct SlowModel {
    pub delay: Duration,
}

#[async_trait]
impl ChatModel for SlowModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> std::result::Result<String, ModelError> {
        tokio::time::sleep(self.delay).await;
        Ok("too late".to_string())
    }
}

/// Loopback HTTP/1.1 server. Every request is answered with
/// `respond(target, base_url)` and its request target is recorded.
pub struct LocalServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl LocalServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let server_base = base_url.clone();
        let server_hits = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let respond = respond.clone();
                let base_url = server_base.clone();
                let hits = server_hits.clone();
                tokio::spawn(async move {
                    let Some(target) = read_request(&mut socket).await else {
                        return;
                    };
                    hits.lock().unwrap().push(target.clone());
                    let (status, body) = respond(&target, &base_url);
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason_phrase(status),
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base_url, hits }
    }

    /// Request targets seen so far, in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

/// Read one request (head plus `Content-Length` body) and return its target.
async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    head.lines().next()?.split_whitespace().nth(1).map(str::to_string)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
