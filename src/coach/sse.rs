//! Incremental decoder for chat-completion Server-Sent Events.
//!
//! Network reads can split a frame anywhere, including in the middle
//! of a multi-byte character or in the middle of a JSON payload. The
//! decoder keeps the undecoded bytes and the unresolved text between
//! reads so that every text delta is emitted exactly once and in wire
//! order.
use serde_json::Value;

/// Payload value that marks the end of the deltas.
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &str = "data: ";
const COMMENT_PREFIX: char = ':';

// A deferred payload that keeps growing without ever parsing is
// corrupt, not split.
const MAX_DEFERRED_LEN: usize = 64 * 1024;

/// Stateful UTF-8 decoder that holds back an incomplete trailing
/// sequence until the next read completes it. Invalid bytes decode to
/// U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..end]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = end + len;
                        }
                        // Incomplete sequence at the end of the read
                        None => {
                            start = end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
        out
    }

    fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

/// Lifecycle of a decoder. There is no transition out of `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// No delta has been produced yet.
    Idle,
    /// At least one delta has been produced.
    Receiving,
    /// The stream ended. Further input is ignored.
    Finalized,
}

enum LineOutcome {
    Ignored,
    Delta(String),
    Done,
    Deferred,
}

/// Turns raw response bytes into ordered text deltas.
///
/// Feed each read with [`SseDecoder::feed`] and call
/// [`SseDecoder::finish`] once the body ends.
#[derive(Debug)]
pub struct SseDecoder {
    utf8: Utf8Decoder,
    carry: String,
    deferred: Option<String>,
    state: DecoderState,
    saw_sentinel: bool,
    dropped_frames: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            utf8: Utf8Decoder::default(),
            carry: String::new(),
            deferred: None,
            state: DecoderState::Idle,
            saw_sentinel: false,
            dropped_frames: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn saw_sentinel(&self) -> bool {
        self.saw_sentinel
    }

    /// Number of data frames that never parsed and were discarded.
    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames
    }

    /// Process one read of the response body and return the deltas it
    /// completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.state == DecoderState::Finalized || self.saw_sentinel {
            return Vec::new();
        }
        let text = self.utf8.decode(chunk);
        self.carry.push_str(&text);
        self.drain_lines(false)
    }

    /// Flush whatever is left once the body has ended. Frames that
    /// still fail to parse are dropped.
    pub fn finish(&mut self) -> Vec<String> {
        if self.state == DecoderState::Finalized {
            return Vec::new();
        }

        let mut deltas = Vec::new();
        if !self.saw_sentinel {
            let tail = self.utf8.finish();
            self.carry.push_str(&tail);
            if !self.carry.is_empty() && !self.carry.ends_with('\n') {
                self.carry.push('\n');
            }
            deltas = self.drain_lines(true);
        }

        if let Some(partial) = self.deferred.take() {
            self.dropped_frames += 1;
            tracing::warn!("Dropping unparseable frame at end of stream: {}", partial);
        }
        self.carry.clear();
        self.state = DecoderState::Finalized;
        deltas
    }

    fn drain_lines(&mut self, flushing: bool) -> Vec<String> {
        let mut deltas = Vec::new();

        while let Some(idx) = self.carry.find('\n') {
            let mut line: String = self.carry.drain(..=idx).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            match self.process_line(&line) {
                LineOutcome::Ignored => {}
                LineOutcome::Delta(text) => {
                    self.state = DecoderState::Receiving;
                    deltas.push(text);
                }
                LineOutcome::Done => {
                    self.saw_sentinel = true;
                    self.deferred = None;
                    self.carry.clear();
                    break;
                }
                // Wait for the next read before looking at more lines
                LineOutcome::Deferred if !flushing => break,
                LineOutcome::Deferred => {}
            }
        }

        deltas
    }

    fn process_line(&mut self, line: &str) -> LineOutcome {
        if let Some(partial) = self.deferred.take() {
            return self.continue_deferred(partial, line);
        }

        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            return LineOutcome::Ignored;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return LineOutcome::Ignored;
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return LineOutcome::Done;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(event) => delta_outcome(&event),
            Err(e) => {
                tracing::debug!("Deferring partial frame ({}): {}", e, payload);
                self.deferred = Some(payload.to_string());
                LineOutcome::Deferred
            }
        }
    }

    /// A previous payload failed to parse because it was split by a
    /// newline. Try to complete it with the next line.
    fn continue_deferred(&mut self, partial: String, line: &str) -> LineOutcome {
        if line.is_empty() {
            self.deferred = Some(partial);
            return LineOutcome::Ignored;
        }

        // A continuation can start with ':' when the split falls right
        // before a key separator, so the join is tried before treating
        // the line as a comment.
        let data_payload = line.strip_prefix(DATA_PREFIX).map(str::trim);
        let piece = data_payload.unwrap_or(line.trim());
        let joined = format!("{}\n{}", partial, piece);

        if let Ok(event) = serde_json::from_str::<Value>(&joined) {
            return delta_outcome(&event);
        }

        // A new data frame that does not complete the deferred one
        // replaces it, and may itself be deferred.
        if data_payload.is_some() {
            self.dropped_frames += 1;
            tracing::warn!("Dropping unparseable frame: {}", partial);
            return self.process_line(line);
        }

        if line.starts_with(COMMENT_PREFIX) {
            self.deferred = Some(partial);
            return LineOutcome::Ignored;
        }

        if joined.len() > MAX_DEFERRED_LEN {
            self.dropped_frames += 1;
            tracing::warn!("Dropping oversized unparseable frame ({} bytes)", joined.len());
            return LineOutcome::Ignored;
        }

        self.deferred = Some(joined);
        LineOutcome::Deferred
    }
}

fn delta_outcome(event: &Value) -> LineOutcome {
    match delta_content(event) {
        Some(text) if !text.is_empty() => LineOutcome::Delta(text.to_string()),
        _ => LineOutcome::Ignored,
    }
}

/// Text of the first choice's delta, if the event carries one.
pub fn delta_content(event: &Value) -> Option<&str> {
    event["choices"][0]["delta"]["content"].as_str()
}
