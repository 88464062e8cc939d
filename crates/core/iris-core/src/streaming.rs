//! Streaming response support
//!
//! The chat service answers with newline-delimited JSON. [`LineDecoder`]
//! frames the raw body into lines, [`parse_content_line`] pulls the text
//! delta out of each record, and [`StreamAccumulator`] turns the resulting
//! delta stream into the growing text shown to the user.

use crate::{IrisError, Result};
use serde_json::Value;
use tokio::sync::mpsc;

/// One text delta received from the chat service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Newly received text
    pub text: String,
    /// Position of this chunk in the stream, starting at 0
    pub index: usize,
}

/// Stream of text deltas; `None` marks the end of the response
pub type TextStream = mpsc::Receiver<Result<TextChunk>>;

/// Stream sender
pub type TextStreamSender = mpsc::Sender<Result<TextChunk>>;

/// Create a new text stream
pub fn create_text_stream(buffer_size: usize) -> (TextStreamSender, TextStream) {
    mpsc::channel(buffer_size)
}

/// Producer side of a [`TextStream`]
pub struct StreamHandler {
    sender: TextStreamSender,
    next_index: usize,
}

impl StreamHandler {
    /// Create a new stream handler
    pub fn new(sender: TextStreamSender) -> Self {
        Self {
            sender,
            next_index: 0,
        }
    }

    /// Send a chunk of text
    pub async fn send_chunk(&mut self, text: String) -> Result<()> {
        let chunk = TextChunk {
            text,
            index: self.next_index,
        };
        self.sender
            .send(Ok(chunk))
            .await
            .map_err(|e| IrisError::other(format!("Failed to send chunk: {}", e)))?;
        self.next_index += 1;
        Ok(())
    }

    /// Send an error
    pub async fn send_error(&self, error: IrisError) -> Result<()> {
        self.sender
            .send(Err(error))
            .await
            .map_err(|e| IrisError::other(format!("Failed to send error: {}", e)))
    }

    /// Resolves once the receiving side has been dropped
    pub async fn closed(&self) {
        self.sender.closed().await
    }

    /// Number of chunks sent so far
    pub fn chunks_sent(&self) -> usize {
        self.next_index
    }
}

/// Splits a byte stream into newline-terminated lines
///
/// Bytes are buffered until a `\n` arrives, so records split across network
/// reads (including inside a multi-byte character) come out whole.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every line completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    /// Return the trailing line that never got a newline, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        Some(decode_line(&line))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Extract the text delta from one streamed record
///
/// Blank lines and records without a `content` field yield `None` quietly.
/// Lines that are not JSON objects, or whose `content` is not a string, are
/// logged and skipped.
pub fn parse_content_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let record: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(target: "api", "Failed to parse chunk: {}", line);
            return None;
        }
    };

    let Some(object) = record.as_object() else {
        tracing::warn!(target: "api", "Failed to parse chunk: {}", line);
        return None;
    };

    match object.get("content") {
        Some(Value::String(content)) => Some(content.clone()),
        Some(_) => {
            tracing::warn!(target: "api", "Chunk content is not a string: {}", line);
            None
        }
        None => {
            tracing::trace!(target: "api", "Chunk without content ignored: {}", line);
            None
        }
    }
}

/// Turns a stream of deltas into a stream of growing text
///
/// For deltas `d1, d2, ..., dn` it yields `d1`, `d1+d2`, ..., `d1+...+dn`.
/// After an error or the end of the stream it yields nothing more. Dropping
/// the accumulator drops the underlying stream, which stops the reader.
pub struct StreamAccumulator {
    stream: TextStream,
    text: String,
    done: bool,
}

impl StreamAccumulator {
    /// Wrap a delta stream
    pub fn new(stream: TextStream) -> Self {
        Self {
            stream,
            text: String::new(),
            done: false,
        }
    }

    /// Wait for the next delta and return the accumulated text
    ///
    /// Returns `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<String>> {
        if self.done {
            return None;
        }
        match self.stream.recv().await {
            Some(Ok(chunk)) => {
                self.text.push_str(&chunk.text);
                Some(Ok(self.text.clone()))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the accumulator, returning the accumulated text
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Collect all chunks from a stream into a single string
pub async fn collect_stream(stream: TextStream) -> Result<String> {
    let mut accumulator = StreamAccumulator::new(stream);
    while let Some(step) = accumulator.next().await {
        step?;
    }
    Ok(accumulator.into_text())
}
