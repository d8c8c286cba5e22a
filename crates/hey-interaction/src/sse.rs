//! Server-sent-event ingestion for streamed chat completions.
//!
//! The transport hands over raw byte chunks; [`LineBuffer`] reassembles them
//! into lines and [`SseAccumulator`] turns `data:` lines into text deltas.

use hey_core::completion::DeltaSink;
use hey_core::error::{HeyError, Result};
use serde::Deserialize;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Splits a byte stream into lines. Bytes are buffered until a newline so a
/// multi-byte character split across chunks is decoded intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    /// The trailing partial line, if the stream ended without a newline.
    pub fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| decode_line(&self.pending))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}

/// Accumulates streamed deltas into the final assistant text.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    text: String,
    done: bool,
}

impl SseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Handles one line of the event stream.
    ///
    /// Lines that are not `data:` lines (blank keep-alives, `event:`, comments)
    /// are ignored, as is everything after `[DONE]`. A `data:` payload that is
    /// not JSON aborts the stream with a parse error; JSON without `choices`
    /// (an in-stream error event) aborts it with a schema error.
    pub fn feed_line(&mut self, line: &str, sink: &mut dyn DeltaSink) -> Result<()> {
        if self.done {
            return Ok(());
        }
        let Some(data) = line.trim().strip_prefix(DATA_PREFIX) else {
            return Ok(());
        };
        let data = data.trim();
        if data == DONE_SENTINEL {
            self.done = true;
            return Ok(());
        }

        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| HeyError::parse(format!("invalid stream event: {e}"), line))?;
        let chunk: StreamChunk = serde_json::from_value(value)
            .map_err(|e| HeyError::schema(format!("unexpected stream event: {e}"), line))?;

        if let Some(delta) = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
        {
            sink.on_delta(&delta);
            self.text.push_str(&delta);
        }
        Ok(())
    }

    /// The full text. End of stream without `[DONE]` is accepted.
    pub fn finish(self) -> String {
        self.text
    }
}

/// Feeds a complete sequence of lines through a fresh accumulator.
pub fn ingest_lines<I, S>(lines: I, sink: &mut dyn DeltaSink) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut accumulator = SseAccumulator::new();
    for line in lines {
        accumulator.feed_line(line.as_ref(), sink)?;
        if accumulator.is_done() {
            break;
        }
    }
    Ok(accumulator.finish())
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}
