use std::pin::Pin;

use futures_util::Stream;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use super::response::{CallWarning, FinishReason, RequestMetadata, Usage};
use crate::error::LlmError;

/// One canonical event of a streamed completion
///
/// Streams are ordered `stream-start`, then any number of
/// `text-start`/`text-delta` runs, then `finish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamPart {
    /// First part of every stream
    StreamStart { warnings: Vec<CallWarning> },
    /// Opens the text block `id`
    TextStart { id: String },
    /// Appends to the open text block `id`
    TextDelta { id: String, delta: String },
    /// Terminal part; the open text block is closed implicitly
    #[serde(rename_all = "camelCase")]
    Finish { finish_reason: FinishReason, usage: Usage },
}

/// Ordered stream of canonical parts; ends after the first error
pub type PartStream = Pin<Box<dyn Stream<Item = Result<StreamPart, LlmError>> + Send>>;

/// Response details available once streaming starts
#[derive(Debug, Clone)]
pub struct StreamResponseMetadata {
    pub headers: HeaderMap,
}

/// Result of a streaming call
pub struct StreamResult {
    pub stream: PartStream,
    pub request: RequestMetadata,
    pub response: StreamResponseMetadata,
}
