//! Server-Sent Events framing for streamed completions.
//!
//! Wraps [`LinesCodec`] with a maximum line length so a misbehaving
//! upstream cannot grow a single event without bound, and decodes the
//! OpenAI-style `data:` payloads carried on each line.

use bytes::BytesMut;
use serde::Deserialize;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum SSE line length accepted from the upstream: 1 MiB.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Terminal sentinel sent by OpenAI-compatible servers.
const DONE_SENTINEL: &str = "[DONE]";

/// Line decoder for upstream SSE bodies.
#[derive(Debug)]
pub struct SseLineCodec(LinesCodec);

impl SseLineCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for SseLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SseLineCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

fn map_codec_error(e: LinesCodecError) -> AppError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Llm(format!("sse line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => AppError::Llm(format!("stream read failed: {io_err}")),
    }
}

/// Meaning of one decoded SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A text fragment to forward.
    Delta(String),
    /// The upstream signalled the end of the completion.
    Done,
    /// Blank lines, comments, non-data fields and empty deltas.
    Skip,
}

#[derive(Debug, Deserialize)]
struct ChunkEnvelope {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Interpret a single SSE line from a chat completions stream.
///
/// # Errors
///
/// Returns `AppError::Llm` if a `data:` payload is not valid chunk JSON.
pub fn parse_line(line: &str) -> Result<SseEvent> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Ok(SseEvent::Done);
    }
    if payload.is_empty() {
        return Ok(SseEvent::Skip);
    }

    let chunk: ChunkEnvelope = serde_json::from_str(payload)
        .map_err(|err| AppError::Llm(format!("invalid stream chunk: {err}")))?;
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(SseEvent::Skip);
    };

    match choice.delta.content {
        Some(text) if !text.is_empty() => Ok(SseEvent::Delta(text)),
        _ if choice.finish_reason.is_some() => Ok(SseEvent::Done),
        _ => Ok(SseEvent::Skip),
    }
}
