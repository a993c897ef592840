//! Incremental decoding of streamed completion responses.
//!
//! A response body arrives in arbitrary byte chunks. [`FrameDecoder`] turns
//! those chunks into frames separated by a blank line, holding back whatever
//! trails the last separator (including a partially received UTF-8 sequence)
//! until more bytes arrive. Each frame carries either a bare JSON payload or
//! one or more `data:` lines, and is reduced to a [`StreamFrame`].
//!
//! [`decode_stream`] drives a decoder over a byte stream and hands every
//! content delta to a callback in arrival order.

use std::fmt;

use futures_util::{Stream, StreamExt};
use memchr::memmem;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::constants::DONE_SENTINEL;

const FRAME_DELIMITER: &[u8] = b"\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Delta(String),
    Done,
    Error(String),
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    buffer: String,
    malformed: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every frame completed by it.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamFrame> {
        self.pending.extend_from_slice(bytes);
        self.decode_pending(false);
        self.drain_complete_frames()
    }

    /// Flush the decoder at end of stream. Whatever followed the last
    /// delimiter is parsed as a final frame.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        self.decode_pending(true);
        let mut frames = self.drain_complete_frames();
        let rest = std::mem::take(&mut self.buffer);
        frames.extend(parse_frame(&rest, &mut self.malformed));
        frames
    }

    /// Number of payloads that could not be parsed so far.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn decode_pending(&mut self, flush: bool) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    append_text(&mut self.buffer, text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(prefix) = std::str::from_utf8(&self.pending[..valid]) {
                        append_text(&mut self.buffer, prefix);
                    }
                    match err.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        // Incomplete sequence at the end: wait for the rest.
                        None if !flush => {
                            self.pending.drain(..valid);
                            return;
                        }
                        None => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.clear();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_complete_frames(&mut self) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(pos) = memmem::find(&self.buffer.as_bytes()[consumed..], FRAME_DELIMITER) {
            let end = consumed + pos;
            frames.extend(parse_frame(&self.buffer[consumed..end], &mut self.malformed));
            consumed = end + FRAME_DELIMITER.len();
        }
        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        frames
    }
}

fn append_text(buffer: &mut String, text: &str) {
    buffer.extend(text.chars().filter(|ch| *ch != '\r'));
}

fn is_ignored_field(line: &str) -> bool {
    line.starts_with(':')
        || line.starts_with("event:")
        || line.starts_with("id:")
        || line.starts_with("retry:")
}

fn frame_payloads(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    // Every `data:` line of one event belongs to the same payload.
    let data: Vec<&str> = trimmed
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("data:"))
        .map(|payload| payload.strip_prefix(' ').unwrap_or(payload))
        .collect();
    if !data.is_empty() {
        let payload = data.join("\n");
        let payload = payload.trim();
        return if payload.is_empty() {
            Vec::new()
        } else {
            vec![payload.to_string()]
        };
    }

    let bare: Vec<&str> = trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_ignored_field(line))
        .collect();
    match bare.len() {
        0 => Vec::new(),
        1 => vec![bare[0].to_string()],
        _ => {
            let joined = bare.join("\n");
            if serde_json::from_str::<Value>(&joined).is_ok() {
                vec![joined]
            } else {
                // Newline-delimited JSON: one payload per line.
                bare.into_iter().map(str::to_string).collect()
            }
        }
    }
}

fn parse_frame(raw: &str, malformed: &mut usize) -> Vec<StreamFrame> {
    frame_payloads(raw)
        .into_iter()
        .filter_map(|payload| match parse_payload(&payload) {
            Ok(frame) => frame,
            Err(err) => {
                *malformed += 1;
                warn!(error = %err, payload = %preview(&payload), "skipping malformed stream frame");
                None
            }
        })
        .collect()
}

/// Interpret one payload. `Ok(None)` means a well-formed frame without
/// content, such as a role-only delta.
pub fn parse_payload(payload: &str) -> Result<Option<StreamFrame>, serde_json::Error> {
    if payload == DONE_SENTINEL {
        return Ok(Some(StreamFrame::Done));
    }
    let value: Value = serde_json::from_str(payload)?;
    if let Some(content) = extract_content(&value) {
        return Ok(Some(StreamFrame::Delta(content.to_string())));
    }
    if let Some(message) = extract_error(&value) {
        return Ok(Some(StreamFrame::Error(message)));
    }
    debug!(payload = %preview(payload), "stream frame carried no content");
    Ok(None)
}

/// Content carried by a response object: a direct `content` field, or the
/// first choice's `delta.content` or `message.content`. Empty strings are
/// treated as absent.
pub fn extract_content(value: &Value) -> Option<&str> {
    fn non_empty(value: Option<&Value>) -> Option<&str> {
        value.and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    non_empty(value.get("content"))
        .or_else(|| non_empty(value.pointer("/choices/0/delta/content")))
        .or_else(|| non_empty(value.pointer("/choices/0/message/content")))
}

pub fn extract_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(map) => Some(
            map.get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        ),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn preview(payload: &str) -> String {
    const LIMIT: usize = 100;
    if payload.chars().count() > LIMIT {
        let head: String = payload.chars().take(LIMIT).collect();
        format!("{head}...")
    } else {
        payload.to_string()
    }
}

/// What a fully consumed stream produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub text: String,
    pub deltas: usize,
    pub malformed: usize,
    pub saw_sentinel: bool,
    /// Error reported in-band by the server.
    pub error: Option<String>,
    /// Read failure that ended the stream early.
    pub interrupted: Option<String>,
}

impl StreamSummary {
    fn apply<F: FnMut(&str)>(&mut self, frame: StreamFrame, on_delta: &mut F) {
        match frame {
            StreamFrame::Delta(content) => {
                self.deltas += 1;
                self.text.push_str(&content);
                on_delta(&content);
            }
            StreamFrame::Done => self.saw_sentinel = true,
            StreamFrame::Error(message) => {
                warn!(%message, "stream reported an error");
                self.error = Some(message);
            }
        }
    }
}

/// Consume `stream` to completion, delivering deltas to `on_delta` before the
/// next chunk is read. A read error ends the loop early but keeps everything
/// decoded up to that point.
pub async fn decode_stream<S, B, E, F>(mut stream: S, mut on_delta: F) -> StreamSummary
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
    F: FnMut(&str),
{
    let mut decoder = FrameDecoder::new();
    let mut summary = StreamSummary::default();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                for frame in decoder.push(bytes.as_ref()) {
                    summary.apply(frame, &mut on_delta);
                }
            }
            Err(err) => {
                warn!(error = %err, "stream read failed; keeping partial content");
                summary.interrupted = Some(err.to_string());
                break;
            }
        }
    }

    for frame in decoder.finish() {
        summary.apply(frame, &mut on_delta);
    }
    summary.malformed = decoder.malformed();
    debug!(
        deltas = summary.deltas,
        malformed = summary.malformed,
        sentinel = summary.saw_sentinel,
        "stream finished"
    );
    summary
}
