use http::StatusCode;

/// Domain errors that know how to present themselves over HTTP
///
/// The hosting layer turns these into responses, so domain crates never
/// depend on axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `conversion_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Whether the failure originated in the caller's input
    fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
