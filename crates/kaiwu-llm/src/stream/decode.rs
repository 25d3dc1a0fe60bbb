//! Byte stream -> text frames

use std::fmt;
use std::future;
use std::pin::Pin;

use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt, stream};
use kaiwu_config::StreamFraming;

use crate::error::LlmError;

/// Sentinel some SSE backends send as the final `data:` payload
const DONE_SENTINEL: &str = "[DONE]";

/// Text frames, each expected to hold one JSON object
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Split a response body into text frames according to `framing`
///
/// A multi-byte character split across network chunks is reassembled before
/// the frame is emitted. Invalid UTF-8 ends the stream with
/// [`LlmError::StreamCorruption`]; a body read failure ends it with
/// [`LlmError::Connection`].
pub fn decode_frames<S, E>(bytes: S, framing: StreamFraming) -> FrameStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    match framing {
        StreamFraming::Chunk | StreamFraming::Lines => split_frames(bytes, framing),
        StreamFraming::Sse => sse_frames(bytes),
    }
}

fn split_frames<S, E>(bytes: S, framing: StreamFraming) -> FrameStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = Some((Box::pin(bytes), FrameSplitter::new(framing)));

    let frames = stream::unfold(state, |state| async move {
        let (mut bytes, mut splitter) = state?;

        let (frames, next): (Vec<Result<String, LlmError>>, _) = match bytes.next().await {
            Some(Ok(chunk)) => match splitter.push(&chunk) {
                Ok(frames) => (frames.into_iter().map(Ok).collect(), Some((bytes, splitter))),
                Err(e) => (vec![Err(e)], None),
            },
            Some(Err(e)) => (vec![Err(LlmError::Connection(e.to_string()))], None),
            None => match splitter.finish() {
                Ok(frames) => (frames.into_iter().map(Ok).collect(), None),
                Err(e) => (vec![Err(e)], None),
            },
        };

        Some((stream::iter(frames), next))
    })
    .flatten();

    Box::pin(frames)
}

fn sse_frames<S, E>(bytes: S) -> FrameStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let frames = bytes
        .eventsource()
        .scan(false, |failed, event| {
            let step = match event {
                _ if *failed => None,
                Ok(event) if event.data.trim() == DONE_SENTINEL => None,
                Ok(event) => Some(Ok(event.data)),
                Err(e) => {
                    *failed = true;
                    Some(Err(sse_error(e)))
                }
            };
            future::ready(step)
        })
        .filter(|frame| future::ready(!matches!(frame, Ok(data) if data.trim().is_empty())));

    Box::pin(frames)
}

fn sse_error<E: fmt::Display>(error: EventStreamError<E>) -> LlmError {
    match error {
        EventStreamError::Transport(e) => LlmError::Connection(e.to_string()),
        other => LlmError::StreamCorruption(other.to_string()),
    }
}

/// Incremental UTF-8 decoder that holds back a trailing partial character
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode as much of the buffered input as forms complete characters
    fn decode(&mut self, bytes: &[u8]) -> Result<String, LlmError> {
        self.pending.extend_from_slice(bytes);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(LlmError::StreamCorruption(format!("invalid UTF-8 in stream: {e}"))),
        };

        let rest = self.pending.split_off(valid);
        let decoded = std::mem::replace(&mut self.pending, rest);

        String::from_utf8(decoded).map_err(|e| LlmError::StreamCorruption(format!("invalid UTF-8 in stream: {e}")))
    }

    fn is_clean(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Turns decoded text into frames for the chunk and line framings
#[derive(Debug)]
struct FrameSplitter {
    framing: StreamFraming,
    utf8: Utf8Decoder,
    buffer: String,
}

impl FrameSplitter {
    fn new(framing: StreamFraming) -> Self {
        Self {
            framing,
            utf8: Utf8Decoder::default(),
            buffer: String::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, LlmError> {
        let text = self.utf8.decode(chunk)?;
        self.buffer.push_str(&text);

        let frames = match self.framing {
            // A chunk that ends inside a character is not a complete frame yet
            StreamFraming::Chunk if self.utf8.is_clean() => take_frame(&mut self.buffer).into_iter().collect(),
            StreamFraming::Chunk => Vec::new(),
            _ => self.complete_lines(),
        };

        Ok(frames)
    }

    fn finish(&mut self) -> Result<Vec<String>, LlmError> {
        if !self.utf8.is_clean() {
            return Err(LlmError::StreamCorruption(
                "stream ended inside a UTF-8 sequence".to_owned(),
            ));
        }

        Ok(take_frame(&mut self.buffer).into_iter().collect())
    }

    fn complete_lines(&mut self) -> Vec<String> {
        let Some(end) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(end + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Drain the buffer into a frame unless it holds only whitespace
fn take_frame(buffer: &mut String) -> Option<String> {
    let frame = std::mem::take(buffer);
    let trimmed = frame.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
