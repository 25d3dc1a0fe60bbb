use http::StatusCode;
use kaiwu_core::HttpError;
use thiserror::Error;

use crate::protocol::chat::ErrorCode;
use crate::types::Role;

/// Prompt content the converter refuses to translate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Messages with this role have no wire translation
    #[error("Unsupported message role: {role}")]
    UnsupportedRole { role: Role },

    /// Content part type not accepted for the message role
    #[error("Unsupported part type: {part_type}")]
    UnsupportedPart { role: Role, part_type: &'static str },
}

/// Errors surfaced by the adapter
#[derive(Debug, Error)]
pub enum LlmError {
    /// Prompt could not be converted; raised before any network I/O
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Backend answered with a non-success status and an unrecognized body
    #[error("upstream returned {status}: {body}")]
    Transport { status: StatusCode, body: String },

    /// Backend answered with a non-success status and a well-formed error body
    #[error("{message}")]
    Api {
        status: StatusCode,
        message: String,
        code: Option<ErrorCode>,
    },

    /// A streamed chunk could not be decoded or parsed
    #[error("stream corrupted: {0}")]
    StreamCorruption(String),

    /// A successful response body did not match the expected shape
    #[error("invalid response shape: {0}")]
    InvalidResponse(String),

    /// The request could not be sent or the body could not be read
    #[error("connection error: {0}")]
    Connection(String),

    /// The caller's abort signal fired before a response arrived
    #[error("request aborted")]
    Aborted,

    /// No API key configured and the fallback environment variable is unset
    #[error(
        "API key is missing. Pass it using the 'api_key' setting or the {env_var} environment variable."
    )]
    MissingApiKey { env_var: String },

    /// Provider or model settings were rejected
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl LlmError {
    /// Status code reported by the backend, if the failure came from one
    pub const fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Conversion(_) => StatusCode::BAD_REQUEST,
            Self::Transport { .. } | Self::Api { .. } | Self::InvalidResponse(_) | Self::Connection(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::StreamCorruption(_) | Self::MissingApiKey { .. } | Self::InvalidSettings(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Aborted => StatusCode::REQUEST_TIMEOUT,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Conversion(_) => "conversion_error",
            Self::Transport { .. } => "transport_error",
            Self::Api { .. } => "upstream_error",
            Self::StreamCorruption(_) => "stream_corruption_error",
            Self::InvalidResponse(_) => "schema_validation_error",
            Self::Connection(_) => "connection_error",
            Self::Aborted => "aborted",
            Self::MissingApiKey { .. } | Self::InvalidSettings(_) => "configuration_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Conversion(e) => e.to_string(),
            Self::Aborted => "request aborted".to_owned(),
            _ => "Internal server error".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_messages_name_the_offender() {
        let role = ConversionError::UnsupportedRole { role: Role::Assistant };
        assert_eq!(role.to_string(), "Unsupported message role: assistant");

        let part = ConversionError::UnsupportedPart {
            role: Role::User,
            part_type: "tool-call",
        };
        assert_eq!(part.to_string(), "Unsupported part type: tool-call");
    }

    #[test]
    fn api_error_displays_backend_message() {
        let error = LlmError::Api {
            status: StatusCode::BAD_REQUEST,
            message: "bad key".to_owned(),
            code: None,
        };
        assert_eq!(error.to_string(), "bad key");
        assert_eq!(error.upstream_status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn internals_are_not_exposed_to_clients() {
        let error = LlmError::Transport {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "stack trace".to_owned(),
        };
        assert_eq!(error.client_message(), "Internal server error");
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!error.is_client_error());

        let error = LlmError::from(ConversionError::UnsupportedRole { role: Role::Tool });
        assert!(error.is_client_error());
    }
}
