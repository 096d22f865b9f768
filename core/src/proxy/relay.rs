//! Paced event-stream relay
//!
//! Re-segments a backend `text/event-stream` body on blank-line boundaries and
//! re-emits each complete event as its own chunk, with a short pause between
//! events. A dedicated task owns the backend stream and hands frames to the
//! response body through a bounded channel; dropping the response body
//! (client disconnect) stops the task and releases the backend connection.

use std::fmt::Display;
use std::io;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Event separator of the SSE wire format
pub const EVENT_DELIMITER: &str = "\n\n";

pub type RelayItem = Result<Bytes, io::Error>;

/// Incremental UTF-8 decoder.
///
/// A multi-byte character split across reads is held back until the rest of
/// its bytes arrive. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        out.push_str(valid);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end, wait for more bytes
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush state at end of input; a dangling partial character becomes U+FFFD
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Splits accumulated text into delimiter-terminated frames.
///
/// Scanning resumes where the previous call stopped, and consumed frames are
/// removed from the buffer once per call.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: String,
    scanned: usize,
}

impl FrameSplitter {
    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Remove and return every complete frame, delimiter included, in order
    pub fn take_frames(&mut self) -> Vec<Bytes> {
        let delimiter = EVENT_DELIMITER.as_bytes();
        let bytes = self.buffer.as_bytes();

        let mut frames = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(idx) = find_from(bytes, delimiter, from) {
            let end = idx + delimiter.len();
            frames.push(Bytes::copy_from_slice(&bytes[start..end]));
            start = end;
            from = end;
        }

        // Delimiter bytes are ASCII, so `start` is a char boundary
        self.buffer.drain(..start);
        // A delimiter may still complete across the boundary with the next push
        self.scanned = self.buffer.len().saturating_sub(delimiter.len() - 1);
        frames
    }

    /// Text after the last delimiter
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    pub fn into_remainder(self) -> String {
        self.buffer
    }
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|idx| idx + from)
}

#[derive(Debug, Clone)]
pub struct SseRelay {
    pacing: Duration,
    capacity: usize,
}

impl Default for SseRelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(20), 32)
    }
}

impl SseRelay {
    pub fn new(pacing: Duration, capacity: usize) -> Self {
        Self {
            pacing,
            capacity: capacity.max(1),
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Start relaying `upstream` on its own task and return the client-side stream
    pub fn spawn<S, E>(&self, upstream: S) -> ReceiverStream<RelayItem>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.capacity);
        let relay = self.clone();
        tokio::spawn(async move {
            relay.run(upstream, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Relay loop. Returns once the backend stream ends, fails, or the
    /// receiving side goes away.
    pub async fn run<S, E>(self, upstream: S, tx: mpsc::Sender<RelayItem>)
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let mut upstream = Box::pin(upstream);
        let mut decoder = Utf8Decoder::default();
        let mut splitter = FrameSplitter::default();

        loop {
            let next = tokio::select! {
                _ = tx.closed() => {
                    debug!("Client went away, stopping relay");
                    return;
                }
                next = upstream.next() => next,
            };

            match next {
                None => break,
                Some(Ok(chunk)) => {
                    splitter.push(&decoder.decode(&chunk));

                    for frame in splitter.take_frames() {
                        if tx.send(Ok(frame)).await.is_err() {
                            return;
                        }
                        self.pause().await;
                    }
                }
                Some(Err(e)) => {
                    warn!("Upstream stream error, aborting relay: {}", e);
                    let _ = tx
                        .send(Err(io::Error::new(io::ErrorKind::Other, e.to_string())))
                        .await;
                    return;
                }
            }
        }

        // Residual fragment without a trailing delimiter is still delivered
        splitter.push(&decoder.finish());
        let buffer = splitter.into_remainder();
        if !buffer.is_empty() && tx.send(Ok(Bytes::from(buffer))).await.is_err() {
            return;
        }
        let _ = tx.send(Ok(Bytes::from_static(b"\n"))).await;
    }

    async fn pause(&self) {
        if !self.pacing.is_zero() {
            sleep(self.pacing).await;
        }
    }
}
