//! Output stream between the relay session and its consumer.
//!
//! The session task owns the [`StreamAdapter`] half and pushes text chunks
//! into a bounded channel; the consumer owns the [`OutputStream`] half. A
//! full channel suspends the session task, so a slow reader slows down the
//! socket reads instead of growing a buffer.
//!
//! Exactly one terminal event (`End` or `Abort`) is ever delivered. Chunks
//! delivered before an abort stay delivered.

use std::io;

use bytes::Bytes;
use futures::Stream;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Reason used when the producing half disappears without a terminal event.
pub const STREAM_DROPPED_REASON: &str = "relay stream ended unexpectedly";

/// Item delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text chunk, in arrival order
    Chunk(String),
    /// Normal end of the response
    End,
    /// Response aborted with a reason
    Abort(String),
}

/// Producer-side view of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Open,
    Closed,
    Aborted(String),
}

/// Create a connected adapter / output pair with the given buffer capacity.
pub fn output_stream(capacity: usize) -> (StreamAdapter, OutputStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        StreamAdapter {
            tx,
            status: StreamStatus::Open,
        },
        OutputStream { rx, done: false },
    )
}

// =============================================================================
// Producer
// =============================================================================

/// Writes relay output into the stream.
///
/// Every method returns `false` when the event was not delivered because the
/// stream already reached a terminal state or the consumer went away.
#[derive(Debug)]
pub struct StreamAdapter {
    tx: mpsc::Sender<StreamEvent>,
    status: StreamStatus,
}

impl StreamAdapter {
    /// Append a text chunk. Empty chunks are accepted and not forwarded.
    pub async fn on_text_delta(&mut self, text: String) -> bool {
        if !self.is_open() {
            debug!(status = ?self.status, "Dropping text delta after stream end");
            return false;
        }
        if text.is_empty() {
            return true;
        }

        if self.tx.send(StreamEvent::Chunk(text)).await.is_err() {
            debug!("Stream consumer dropped, marking stream aborted");
            self.status = StreamStatus::Aborted("consumer dropped".to_string());
            return false;
        }
        true
    }

    /// Close the stream normally.
    pub async fn on_end(&mut self) -> bool {
        if !self.is_open() {
            debug!(status = ?self.status, "Ignoring end after stream end");
            return false;
        }
        self.status = StreamStatus::Closed;
        // A consumer that already left needs no terminal marker.
        let _ = self.tx.send(StreamEvent::End).await;
        true
    }

    /// Abort the stream with `reason`.
    pub async fn on_abort(&mut self, reason: impl Into<String>) -> bool {
        if !self.is_open() {
            debug!(status = ?self.status, "Ignoring abort after stream end");
            return false;
        }
        let reason = reason.into();
        self.status = StreamStatus::Aborted(reason.clone());
        let _ = self.tx.send(StreamEvent::Abort(reason)).await;
        true
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == StreamStatus::Open
    }
}

// =============================================================================
// Consumer
// =============================================================================

/// Error returned by [`OutputStream::collect_text`] when the stream aborts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stream aborted: {reason}")]
pub struct StreamAborted {
    pub reason: String,
    /// Text delivered before the abort
    pub partial: String,
}

/// Reads relay output.
#[derive(Debug)]
pub struct OutputStream {
    rx: mpsc::Receiver<StreamEvent>,
    done: bool,
}

impl OutputStream {
    /// Next event, or `None` after the terminal event was returned.
    ///
    /// If the adapter is dropped while the stream is still open, an
    /// [`StreamEvent::Abort`] is synthesized so the consumer always sees a
    /// terminal event.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.done {
            return None;
        }

        match self.rx.recv().await {
            Some(StreamEvent::Chunk(text)) => Some(StreamEvent::Chunk(text)),
            Some(terminal) => {
                self.done = true;
                Some(terminal)
            }
            None => {
                self.done = true;
                Some(StreamEvent::Abort(STREAM_DROPPED_REASON.to_string()))
            }
        }
    }

    /// Wait for the terminal event and return the concatenated text.
    pub async fn collect_text(mut self) -> Result<String, StreamAborted> {
        let mut text = String::new();
        while let Some(event) = self.recv().await {
            match event {
                StreamEvent::Chunk(chunk) => text.push_str(&chunk),
                StreamEvent::End => return Ok(text),
                StreamEvent::Abort(reason) => {
                    return Err(StreamAborted {
                        reason,
                        partial: text,
                    });
                }
            }
        }
        Ok(text)
    }

    /// Adapt into a byte stream for an HTTP body.
    ///
    /// An abort surfaces as an `io::Error` item, which terminates the body
    /// with an error after the already-sent chunks.
    pub fn into_body_stream(mut self) -> impl Stream<Item = Result<Bytes, io::Error>> + Send {
        async_stream::stream! {
            while let Some(event) = self.recv().await {
                match event {
                    StreamEvent::Chunk(text) => yield Ok(Bytes::from(text)),
                    StreamEvent::End => break,
                    StreamEvent::Abort(reason) => {
                        yield Err(io::Error::other(reason));
                        break;
                    }
                }
            }
        }
    }
}
