use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/";

/// Environment variable consulted when no API key is configured
pub const DEFAULT_API_KEY_ENV: &str = "CUSTOM_API_KEY";

/// Upstream chat-completions backend configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Provider label reported by models
    #[serde(default = "default_name")]
    pub name: String,
    /// Base URL; non-streaming calls go to `{base_url}/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Streaming endpoint override, defaults to the non-streaming endpoint
    #[serde(default)]
    pub stream_url: Option<Url>,
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Environment variable read at call time when `api_key` is absent
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model id served by the hosting endpoint
    #[serde(default = "default_model")]
    pub model: String,
    /// How the streaming response body is split into JSON objects
    #[serde(default)]
    pub framing: StreamFraming,
    /// Static headers added to every upstream request
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Per-model settings forwarded to the backend
    #[serde(default)]
    pub settings: ChatSettings,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            base_url: default_base_url(),
            stream_url: None,
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            framing: StreamFraming::default(),
            headers: IndexMap::new(),
            settings: ChatSettings::default(),
        }
    }
}

/// Framing of the upstream streaming body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamFraming {
    /// One complete JSON object per network chunk
    #[default]
    Chunk,
    /// Newline-delimited JSON objects
    Lines,
    /// Server-sent events with JSON `data:` payloads
    Sse,
}

/// Settings attached to a model when it is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatSettings {
    /// End-user identifier (6 to 128 characters) used by the backend for abuse tracking
    #[serde(default)]
    pub user_id: Option<String>,
    /// Caller-supplied unique request identifier
    #[serde(default)]
    pub request_id: Option<String>,
    /// Whether sampling is enabled; when false, `temperature` and `top_p` are ignored upstream
    #[serde(default)]
    pub do_sample: Option<bool>,
}

impl ChatSettings {
    /// Allowed length range for `user_id`, in characters
    pub const USER_ID_LEN: std::ops::RangeInclusive<usize> = 6..=128;

    /// Check settings the backend would otherwise reject
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting
    pub fn validate(&self) -> Result<(), String> {
        if let Some(user_id) = &self.user_id {
            let len = user_id.chars().count();
            if !Self::USER_ID_LEN.contains(&len) {
                return Err(format!(
                    "user_id must be between {} and {} characters, got {len}",
                    Self::USER_ID_LEN.start(),
                    Self::USER_ID_LEN.end()
                ));
            }
        }
        Ok(())
    }
}

fn default_name() -> String {
    "custom".to_owned()
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("valid default URL")
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_owned()
}

fn default_model() -> String {
    "custom".to_owned()
}
