//! Non-streaming response validation and extraction

use super::finish_reason::map_finish_reason;
use crate::error::LlmError;
use crate::protocol::chat::{ChatResponse, ChatUsage};
use crate::types::{Content, FinishReason, Usage};

/// Validate a successful response body against the expected shape
///
/// The body must parse into [`ChatResponse`] and carry at least one choice.
pub fn parse_response(body: &str) -> Result<ChatResponse, LlmError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        tracing::debug!(error = %e, "response body failed validation");
        LlmError::InvalidResponse(e.to_string())
    })?;

    if response.choices.is_empty() {
        return Err(LlmError::InvalidResponse(
            "choices must contain at least one entry".to_owned(),
        ));
    }

    Ok(response)
}

/// Canonical output extracted from a validated response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub content: Vec<Content>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl From<&ChatResponse> for GeneratedOutput {
    fn from(response: &ChatResponse) -> Self {
        let choice = response.choices.first();
        let message = choice.map(|choice| &choice.message);

        let content = message
            .and_then(|message| message.content.as_deref())
            .filter(|text| !text.is_empty())
            .map(|text| Content::Text { text: text.to_owned() })
            .into_iter()
            .collect();

        if let Some(calls) = message.and_then(|message| message.tool_calls.as_ref()) {
            tracing::debug!(count = calls.len(), "response carries tool calls, not translated");
        }

        Self {
            content,
            finish_reason: map_finish_reason(choice.and_then(|choice| choice.finish_reason.as_deref())),
            usage: response.usage.into(),
        }
    }
}

impl From<ChatUsage> for Usage {
    fn from(usage: ChatUsage) -> Self {
        Self {
            input_tokens: Some(usage.prompt_tokens),
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}
