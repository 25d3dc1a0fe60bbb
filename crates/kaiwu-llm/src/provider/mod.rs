//! Language-model trait and the chat-completions provider

pub mod custom;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use regex::Regex;

pub use custom::{ChatLanguageModel, CustomProvider};

use crate::error::LlmError;
use crate::types::{CallOptions, GenerateResult, StreamResult};

/// Vendor-neutral language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider label, e.g. `custom`
    fn provider(&self) -> &str;

    /// Model identifier sent upstream
    fn model_id(&self) -> &str;

    /// URL patterns the backend can fetch directly, per media type
    fn supported_urls(&self) -> &[SupportedUrl];

    /// Run a non-streaming completion
    async fn generate(&self, options: CallOptions) -> Result<GenerateResult, LlmError>;

    /// Start a streaming completion
    ///
    /// Returns once response headers arrive; the body is consumed through
    /// [`StreamResult::stream`].
    async fn stream(&self, options: CallOptions) -> Result<StreamResult, LlmError>;
}

/// Media-type pattern paired with the URLs accepted for it
#[derive(Debug, Clone)]
pub struct SupportedUrl {
    /// Media type, with `*` allowed as the subtype, e.g. `image/*`
    pub media_type: String,
    pub pattern: Regex,
}

impl SupportedUrl {
    pub fn new(media_type: impl Into<String>, pattern: Regex) -> Self {
        Self {
            media_type: media_type.into(),
            pattern,
        }
    }

    /// Whether a file of `media_type` at `url` may be passed by reference
    pub fn matches(&self, media_type: &str, url: &str) -> bool {
        let type_matches = match self.media_type.strip_suffix("/*") {
            Some(top_level) => media_type
                .split_once('/')
                .is_some_and(|(candidate, _)| candidate.eq_ignore_ascii_case(top_level)),
            None => media_type.eq_ignore_ascii_case(&self.media_type),
        };

        type_matches && self.pattern.is_match(url)
    }
}

/// Convert configured static headers into a header map
///
/// Invalid names or values are skipped with a warning.
pub fn parse_static_headers(configured: &IndexMap<String, String>) -> HeaderMap {
    configured
        .iter()
        .filter_map(|(name, value)| {
            let parsed = HeaderName::try_from(name.as_str())
                .ok()
                .zip(HeaderValue::try_from(value.as_str()).ok());

            if parsed.is_none() {
                tracing::warn!(header = %name, "ignoring invalid static header");
            }

            parsed
        })
        .collect()
}
