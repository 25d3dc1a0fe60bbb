//! Stream chunks -> canonical stream parts

use std::future;

use futures_util::{Stream, StreamExt, stream};

use crate::convert::map_finish_reason;
use crate::error::LlmError;
use crate::protocol::chat::{ChatStreamChunk, ChatStreamUsage};
use crate::types::{CallWarning, StreamPart, Usage};

/// Id of the single text block every stream uses
pub const TEXT_ID: &str = "txt-0";

/// Per-stream state machine turning chunks into parts
#[derive(Debug)]
pub struct StreamTransformer {
    provider: String,
    warnings: Vec<CallWarning>,
    is_first_chunk: bool,
    is_active_text: bool,
    warned_tool_calls: bool,
}

impl StreamTransformer {
    /// Transformer for one stream; `warnings` go out on `stream-start`
    pub fn new(provider: impl Into<String>, warnings: Vec<CallWarning>) -> Self {
        Self {
            provider: provider.into(),
            warnings,
            is_first_chunk: true,
            is_active_text: false,
            warned_tool_calls: false,
        }
    }

    /// Parts produced by one chunk, in emission order
    pub fn transform(&mut self, chunk: &ChatStreamChunk) -> Vec<StreamPart> {
        let mut parts = Vec::new();

        if self.is_first_chunk {
            parts.push(StreamPart::StreamStart {
                warnings: std::mem::take(&mut self.warnings),
            });
            self.is_first_chunk = false;
        }

        let Some(choice) = chunk.first_choice() else {
            return parts;
        };

        if let Some(delta) = &choice.delta {
            if let Some(text) = delta.content.as_deref().filter(|text| !text.is_empty()) {
                if !self.is_active_text {
                    parts.push(StreamPart::TextStart { id: TEXT_ID.to_owned() });
                    self.is_active_text = true;
                }

                parts.push(StreamPart::TextDelta {
                    id: TEXT_ID.to_owned(),
                    delta: text.to_owned(),
                });
            }

            if delta.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty()) && !self.warned_tool_calls {
                tracing::warn!(provider = %self.provider, "streamed tool calls are not supported, dropping them");
                self.warned_tool_calls = true;
            }
        }

        // Some backends send an empty reason on intermediate chunks
        if let Some(reason) = choice.finish_reason.as_deref().filter(|reason| !reason.is_empty()) {
            parts.push(StreamPart::Finish {
                finish_reason: map_finish_reason(Some(reason)),
                usage: chunk.usage.map(Usage::from).unwrap_or_default(),
            });
        }

        parts
    }
}

impl From<ChatStreamUsage> for Usage {
    fn from(usage: ChatStreamUsage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Drive a transformer over a chunk stream
///
/// The first error is forwarded and ends the stream; no parts follow it.
pub fn transform_chunks<S>(
    chunks: S,
    mut transformer: StreamTransformer,
) -> impl Stream<Item = Result<StreamPart, LlmError>> + Send
where
    S: Stream<Item = Result<ChatStreamChunk, LlmError>> + Send,
{
    chunks
        .scan(false, move |failed, chunk| {
            let step = match chunk {
                _ if *failed => None,
                Ok(chunk) => Some(transformer.transform(&chunk).into_iter().map(Ok).collect::<Vec<_>>()),
                Err(e) => {
                    *failed = true;
                    Some(vec![Err(e)])
                }
            };
            future::ready(step)
        })
        .flat_map(stream::iter)
}
