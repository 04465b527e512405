//! Server-sent-event decoding for streamed chat completions.

use anyhow::{Result, anyhow};
use std::io::BufRead;

use super::types::ChunkResponse;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Done,
    Failed,
}

/// Lazy sequence of text fragments read from an SSE body.
///
/// Yields each non-empty `delta.content` in arrival order. `[DONE]` or end
/// of input finishes the stream; a transport error or an `error` payload is
/// yielded once as `Err`. After either, the iterator only returns `None`.
pub struct CompletionStream<R> {
    reader: R,
    line: String,
    state: StreamState,
}

impl<R: BufRead> CompletionStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            state: StreamState::Streaming,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    fn finish(&mut self) -> Option<Result<String>> {
        tracing::debug!("Completion stream ended");
        self.state = StreamState::Done;
        None
    }

    fn fail(&mut self, err: anyhow::Error) -> Option<Result<String>> {
        tracing::debug!("Completion stream failed: {}", err);
        self.state = StreamState::Failed;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for CompletionStream<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state == StreamState::Streaming {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return self.finish(),
                Ok(_) => {}
                Err(e) => return self.fail(anyhow!("Stream read failed: {}", e)),
            }

            let line = self.line.trim();
            match parse_line(line) {
                Frame::Skip => continue,
                Frame::Done => return self.finish(),
                Frame::Content(text) => return Some(Ok(text)),
                Frame::Error(message) => return self.fail(anyhow!("Stream error: {}", message)),
            }
        }
        None
    }
}

enum Frame {
    Skip,
    Done,
    Content(String),
    Error(String),
}

fn parse_line(line: &str) -> Frame {
    if line.is_empty() || line.starts_with(':') {
        return Frame::Skip;
    }

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        // Some servers answer with a bare JSON error body instead of an event
        if line.starts_with('{') {
            if let Ok(chunk) = serde_json::from_str::<ChunkResponse>(line) {
                if let Some(error) = chunk.error {
                    return Frame::Error(error.to_string());
                }
            }
        }
        // `event:`, `id:`, `retry:` ...
        return Frame::Skip;
    };

    let payload = payload.trim();
    if payload == DONE_MARKER {
        return Frame::Done;
    }

    let chunk: ChunkResponse = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => return Frame::Error(format!("malformed frame ({}): {}", e, payload)),
    };

    if let Some(error) = chunk.error {
        return Frame::Error(error.to_string());
    }

    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
    {
        Some(text) if !text.is_empty() => Frame::Content(text),
        _ => Frame::Skip,
    }
}
