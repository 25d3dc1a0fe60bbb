use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::protocol::chat::{ChatRequest, ChatResponse};

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    /// Natural end of generation or a stop sequence
    Stop,
    /// Output token limit reached
    Length,
    /// Model requested tool calls
    ToolCalls,
    /// Output withheld by content filtering
    ContentFilter,
    /// Backend failed while generating
    Error,
    /// Absent or unrecognized backend value
    #[default]
    Unknown,
}

/// Token counts for a call
///
/// `None` means the backend did not report the count, which is distinct
/// from a reported zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// A block of generated content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Content {
    Text { text: String },
}

/// Non-fatal diagnostic about a call, e.g. a setting that was not forwarded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CallWarning {
    /// A call option the backend does not accept was ignored
    UnsupportedSetting {
        setting: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Free-form warning
    Other { message: String },
}

impl CallWarning {
    pub(crate) fn unsupported_setting(setting: &str) -> Self {
        Self::UnsupportedSetting {
            setting: setting.to_owned(),
            details: None,
        }
    }
}

/// What was sent upstream
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMetadata {
    pub body: ChatRequest,
}

/// What came back from a non-streaming call
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    pub headers: HeaderMap,
    pub body: ChatResponse,
}

/// Result of a non-streaming call
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// Generated content; empty when the backend returned no text
    pub content: Vec<Content>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    pub warnings: Vec<CallWarning>,
    pub request: RequestMetadata,
    pub response: ResponseMetadata,
}

impl GenerateResult {
    /// All text content joined together
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|Content::Text { text }| text.as_str())
            .collect()
    }
}
