//! Text frames -> stream chunks

use futures_util::{Stream, StreamExt};

use crate::error::LlmError;
use crate::protocol::chat::ChatStreamChunk;

/// Parse one frame into a stream chunk
///
/// A frame that is not JSON, or is JSON of the wrong shape, is corruption.
/// Frames are never skipped.
pub fn parse_chunk(frame: &str) -> Result<ChatStreamChunk, LlmError> {
    tracing::debug!(frame = %frame, "stream chunk received");

    serde_json::from_str(frame).map_err(|e| LlmError::StreamCorruption(format!("unparseable stream chunk: {e}")))
}

/// Parse every frame of a stream, passing errors through
pub fn parse_chunks<S>(frames: S) -> impl Stream<Item = Result<ChatStreamChunk, LlmError>> + Send
where
    S: Stream<Item = Result<String, LlmError>> + Send,
{
    frames.map(|frame| frame.and_then(|frame| parse_chunk(&frame)))
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    #[test]
    fn delta_chunk() {
        let chunk = parse_chunk(r#"{"choices":[{"delta":{"content":"He"}}]}"#).unwrap();
        let delta = chunk.first_choice().and_then(|c| c.delta.as_ref()).unwrap();
        assert_eq!(delta.content.as_deref(), Some("He"));
        assert!(chunk.usage.is_none());
    }

    #[test]
    fn usage_only_chunk() {
        let chunk = parse_chunk(r#"{"usage":{"prompt_tokens":5}}"#).unwrap();
        assert!(chunk.first_choice().is_none());
        assert_eq!(chunk.usage.unwrap().prompt_tokens, Some(5));
    }

    #[test]
    fn non_json_is_corruption() {
        assert!(matches!(parse_chunk("not json"), Err(LlmError::StreamCorruption(_))));
    }

    #[test]
    fn wrong_shape_is_corruption() {
        assert!(matches!(parse_chunk(r#"{"choices":"nope"}"#), Err(LlmError::StreamCorruption(_))));
        assert!(matches!(parse_chunk("42"), Err(LlmError::StreamCorruption(_))));
    }

    #[tokio::test]
    async fn upstream_errors_pass_through() {
        let frames = stream::iter(vec![
            Ok(r#"{"choices":[]}"#.to_owned()),
            Err(LlmError::Connection("reset".to_owned())),
        ]);

        let out: Vec<_> = parse_chunks(frames).collect().await;
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(LlmError::Connection(_))));
    }
}
