//! Streaming pipeline
//!
//! Three stages, each usable on its own:
//!
//! 1. [`decode`]: response bytes to text frames
//! 2. [`parse`]: frames to [`ChatStreamChunk`](crate::protocol::chat::ChatStreamChunk)s
//! 3. [`transform`]: chunks to canonical [`StreamPart`]s
//!
//! Every stage forwards the first error it sees and stops.

pub mod decode;
pub mod parse;
pub mod transform;

use std::fmt;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};
use kaiwu_config::StreamFraming;
use tokio_util::sync::CancellationToken;

pub use decode::{FrameStream, decode_frames};
pub use parse::{parse_chunk, parse_chunks};
pub use transform::{StreamTransformer, TEXT_ID, transform_chunks};

use crate::types::{PartStream, StreamPart};

/// Build the full pipeline over a response body
pub fn part_stream<S, E>(bytes: S, framing: StreamFraming, transformer: StreamTransformer) -> PartStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let frames = decode_frames(bytes, framing);
    let chunks = parse_chunks(frames);
    Box::pin(transform_chunks(chunks, transformer))
}

/// Stop a stream as soon as `token` is cancelled
///
/// The inner stream is dropped on cancellation, which releases the
/// underlying connection. Nothing is yielded after that point.
pub fn with_abort_signal(parts: PartStream, token: CancellationToken) -> PartStream {
    let aborted = stream::unfold(parts, move |mut parts| {
        let token = token.clone();
        async move {
            let item = tokio::select! {
                biased;
                () = token.cancelled() => None,
                item = parts.next() => item,
            };

            match item {
                Some(item) => Some((item, parts)),
                None => {
                    if token.is_cancelled() {
                        tracing::debug!("stream aborted by caller");
                    }
                    None
                }
            }
        }
    });

    Box::pin(aborted.fuse())
}

/// Concatenated text deltas of collected parts
pub fn collect_text(parts: &[StreamPart]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            StreamPart::TextDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        })
        .collect()
}
