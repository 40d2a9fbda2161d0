//! Incremental decoding of an OpenAI `text/event-stream` body.
//!
//! Network chunks split lines and UTF-8 sequences arbitrarily, so bytes are
//! buffered until a full line is available and only complete lines are
//! decoded.

use dgen_core::{DgenError, Result};
use serde::Deserialize;

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// `choices[0].delta.content` of one chunk. Never empty.
    Content(String),
    /// The service sent `[DONE]`.
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the events completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<ChunkEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = decode_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Decodes whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Option<Result<ChunkEvent>> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<Result<ChunkEvent>> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim_end_matches('\r'),
        Err(e) => {
            return Some(Err(DgenError::upstream(format!(
                "OpenAI stream is not valid UTF-8: {e}"
            ))));
        }
    };

    // Comments, event names and blank separators carry nothing we use.
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data == DONE_SENTINEL {
        return Some(Ok(ChunkEvent::Done));
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(StreamChunk {
            error: Some(error), ..
        }) => Some(Err(DgenError::upstream(error.message))),
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(|content| Ok(ChunkEvent::Content(content))),
        Err(e) => Some(Err(DgenError::upstream(format!(
            "Failed to parse OpenAI stream chunk: {e}"
        )))),
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}
