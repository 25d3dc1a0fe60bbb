//! Request body assembly

use kaiwu_config::ChatSettings;

use super::messages::{FileUrlResolver, convert_messages};
use crate::error::ConversionError;
use crate::protocol::chat::ChatRequest;
use crate::types::{CallOptions, CallWarning};

/// Request body plus the warnings produced while building it
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub body: ChatRequest,
    pub warnings: Vec<CallWarning>,
}

/// Build the wire request for one call
///
/// Settings the backend does not accept are dropped and reported as
/// warnings. The `stream` flag is left unset; the streaming path sets it.
pub fn build_request(
    model_id: &str,
    settings: &ChatSettings,
    options: &CallOptions,
    resolver: &dyn FileUrlResolver,
) -> Result<PreparedRequest, ConversionError> {
    let messages = convert_messages(&options.prompt, resolver)?;

    let body = ChatRequest {
        model: model_id.to_owned(),
        messages,
        temperature: options.temperature,
        top_p: options.top_p,
        max_tokens: options.max_output_tokens,
        stop: options.stop_sequences.clone(),
        do_sample: settings.do_sample,
        user_id: settings.user_id.clone(),
        request_id: settings.request_id.clone(),
        stream: None,
    };

    Ok(PreparedRequest {
        body,
        warnings: unsupported_settings(options),
    })
}

fn unsupported_settings(options: &CallOptions) -> Vec<CallWarning> {
    [
        ("topK", options.top_k.is_some()),
        ("presencePenalty", options.presence_penalty.is_some()),
        ("frequencyPenalty", options.frequency_penalty.is_some()),
        ("seed", options.seed.is_some()),
    ]
    .into_iter()
    .filter(|(_, present)| *present)
    .map(|(setting, _)| CallWarning::unsupported_setting(setting))
    .collect()
}
