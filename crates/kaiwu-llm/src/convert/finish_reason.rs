use crate::types::FinishReason;

/// Map a backend finish reason onto the canonical enum
///
/// Total over all inputs: absent and unrecognized values become `Unknown`.
pub fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some("sensitive") => FinishReason::ContentFilter,
        Some("network_error") => FinishReason::Error,
        _ => FinishReason::Unknown,
    }
}
