//! Failed-response classification

use http::StatusCode;

use crate::error::LlmError;
use crate::protocol::chat::ChatErrorResponse;

/// Classify a non-success response body
///
/// A body matching the backend's error envelope becomes [`LlmError::Api`]
/// carrying its message and code; anything else becomes
/// [`LlmError::Transport`] with the raw body.
pub fn classify_failure(status: StatusCode, body: &str) -> LlmError {
    match serde_json::from_str::<ChatErrorResponse>(body) {
        Ok(ChatErrorResponse { error }) => LlmError::Api {
            status,
            message: error.message,
            code: error.code,
        },
        Err(_) => LlmError::Transport {
            status,
            body: body.to_owned(),
        },
    }
}

/// Read a failed response body and classify it
pub(crate) async fn classify_response(provider: &str, response: reqwest::Response) -> LlmError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    tracing::warn!(
        provider = %provider,
        status = %status,
        "upstream returned error"
    );

    classify_failure(status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::chat::ErrorCode;

    #[test]
    fn error_envelope_becomes_api_error() {
        let err = classify_failure(StatusCode::BAD_REQUEST, r#"{"error":{"message":"bad key","code":401}}"#);

        let LlmError::Api { status, message, code } = &err else {
            panic!("expected api error, got {err:?}");
        };
        assert_eq!(*status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "bad key");
        assert_eq!(code.as_ref().map(ToString::to_string).as_deref(), Some("401"));
        assert_eq!(err.to_string(), "bad key");
    }

    #[test]
    fn string_code_and_missing_code() {
        let err = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down","code":"1302"}}"#,
        );
        assert!(matches!(err, LlmError::Api { code: Some(ErrorCode::Text(ref c)), .. } if c == "1302"));

        let err = classify_failure(StatusCode::BAD_REQUEST, r#"{"error":{"message":"nope"}}"#);
        assert!(matches!(err, LlmError::Api { code: None, .. }));
    }

    #[test]
    fn unrecognized_body_becomes_transport_error() {
        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");

        let LlmError::Transport { status, body } = err else {
            panic!("expected transport error");
        };
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "upstream exploded");
    }

    #[test]
    fn json_without_envelope_is_transport_error() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, r#"{"message":"proxy"}"#);
        assert!(matches!(err, LlmError::Transport { .. }));
    }
}
