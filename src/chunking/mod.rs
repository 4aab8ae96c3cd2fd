//! Head chunking of transcripts.
//!
//! A transcript is reduced to a single leading excerpt bounded by a character
//! budget, cut back to the last complete sentence where one exists.

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

/// Appended when a chunk had to be cut mid-sentence.
pub const TRUNCATION_MARKER: &str = "...";

/// Chunks text to a fixed character budget.
#[derive(Debug, Clone, Copy)]
pub struct HeadChunker {
    max_chars: usize,
}

impl HeadChunker {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn chunk(&self, text: &str) -> String {
        chunk_text(text, self.max_chars)
    }
}

impl Default for HeadChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_CHARS)
    }
}

/// Cut `text` down to at most `max_chars` characters on a sentence boundary.
///
/// Text that already fits is returned unchanged. Otherwise the first
/// `max_chars` characters are kept up to and including the last `.`; if the
/// prefix contains no `.` at all it is returned with [`TRUNCATION_MARKER`]
/// appended.
pub fn chunk_text(text: &str, max_chars: usize) -> String {
    let prefix = match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => return text.to_string(),
    };

    match prefix.rfind('.') {
        Some(dot) => prefix[..=dot].to_string(),
        None => format!("{}{}", prefix, TRUNCATION_MARKER),
    }
}
