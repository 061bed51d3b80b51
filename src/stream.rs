//! Reassembly of `\r\n`-delimited JSON messages from a long-lived response.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use log::{trace, warn};
use tokio_util::sync::CancellationToken;

use crate::request::{ProgressHandler, RequestState, StateCell};
use crate::{Error, Json, Result};

const DELIMITER: &[u8] = b"\r\n";

/// A decoded stream message.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Message(Json),
    /// The server warns that the client is falling behind.
    StallWarning(StallWarning),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StallWarning {
    pub code: Option<String>,
    pub message: Option<String>,
    pub percent_full: Option<i64>,
}

impl StreamMessage {
    fn from_json(json: Json) -> Self {
        let warning = &json["warning"];
        if warning.as_object().is_some() {
            return StreamMessage::StallWarning(StallWarning {
                code: warning["code"].as_str().map(str::to_owned),
                message: warning["message"].as_str().map(str::to_owned),
                percent_full: warning["percent_full"].as_i64(),
            });
        }
        StreamMessage::Message(json)
    }
}

/// Splits incoming chunks on `\r\n` and keeps an incomplete trailing message
/// until the next chunk completes it.
///
/// The buffer is raw bytes, so a multi-byte character split across chunks is
/// reassembled before decoding.
#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every message it completes, in order.
    ///
    /// Empty segments (keep-alive newlines) are skipped. A segment that fails
    /// to decode is kept only when it is the trailing one. A malformed segment
    /// already followed by a delimiter can never complete, so it is logged and
    /// dropped rather than buffered; this deliberately departs from stopping
    /// reassembly at the first bad segment, which would stall the stream.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamMessage> {
        let mut data = std::mem::take(&mut self.buffer);
        data.extend_from_slice(chunk);

        let segments = split_segments(&data);
        let last = segments.len() - 1;
        let mut messages = Vec::new();
        for (i, segment) in segments.into_iter().enumerate() {
            if segment.is_empty() {
                continue;
            }
            match Json::parse(segment) {
                Ok(json) => messages.push(StreamMessage::from_json(json)),
                Err(_) if i == last => {
                    trace!("buffering {} bytes of partial message", segment.len());
                    self.buffer = segment.to_vec();
                }
                Err(err) => warn!("dropping malformed stream message: {}", err),
            }
        }
        messages
    }

    /// Bytes held back waiting for the rest of a message.
    pub fn remainder(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn split_segments(data: &[u8]) -> Vec<&[u8]> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + DELIMITER.len() <= data.len() {
        if &data[i..i + DELIMITER.len()] == DELIMITER {
            segments.push(&data[start..i]);
            i += DELIMITER.len();
            start = i;
        } else {
            i += 1;
        }
    }
    segments.push(&data[start..]);
    segments
}

/// An open stream; pull messages with [`MessageStream::next`].
pub struct MessageStream {
    response: reqwest::Response,
    reassembler: Reassembler,
    pending: VecDeque<StreamMessage>,
    progress: Option<ProgressHandler>,
    cancellation: CancellationToken,
    state: Arc<StateCell>,
    received: usize,
    done: bool,
}

impl fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("url", &self.response.url().as_str())
            .field("state", &self.state.get())
            .field("received", &self.received)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl MessageStream {
    pub(crate) fn new(
        response: reqwest::Response,
        progress: Option<ProgressHandler>,
        cancellation: CancellationToken,
        state: Arc<StateCell>,
    ) -> Self {
        MessageStream {
            response,
            reassembler: Reassembler::new(),
            pending: VecDeque::new(),
            progress,
            cancellation,
            state,
            received: 0,
            done: false,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state.get()
    }

    /// Close the stream; the next call to `next` reports [`Error::Cancelled`].
    pub fn stop(&self) {
        self.cancellation.cancel();
    }

    /// Next complete message, or `None` once the server closes the stream.
    pub async fn next(&mut self) -> Option<Result<StreamMessage>> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Some(Ok(message));
            }
            if self.done {
                return None;
            }

            let chunk = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Err(Error::Cancelled),
                chunk = self.response.chunk() => chunk.map_err(Error::from),
            };
            match chunk {
                Ok(Some(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    self.received += chunk.len();
                    if let Some(ref progress) = self.progress {
                        progress(&chunk, self.received, None);
                    }
                    let messages = self.reassembler.feed(&chunk);
                    self.pending.extend(messages);
                }
                Ok(None) => {
                    self.done = true;
                    if !self.reassembler.is_empty() {
                        warn!(
                            "stream closed with {} bytes of incomplete message",
                            self.reassembler.remainder().len()
                        );
                    }
                    self.state.set(RequestState::Completed);
                }
                Err(err) => {
                    self.done = true;
                    self.state.set(if err.is_cancelled() {
                        RequestState::Cancelled
                    } else {
                        RequestState::Failed
                    });
                    return Some(Err(err));
                }
            }
        }
    }
}
