//! Chat-completions provider and its language models

use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use kaiwu_config::{ChatSettings, ProviderConfig, StreamFraming};
use kaiwu_core::{HeaderOverrides, bearer_authorization, combine_headers};
use regex::Regex;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use super::{LanguageModel, SupportedUrl, parse_static_headers};
use crate::classify::classify_response;
use crate::convert::{FileUrlResolver, GeneratedOutput, PreparedRequest, UnresolvedFileUrls, build_request, parse_response};
use crate::error::LlmError;
use crate::protocol::chat::ChatRequest;
use crate::stream::{StreamTransformer, part_stream, with_abort_signal};
use crate::types::{
    CallOptions, GenerateResult, RequestMetadata, ResponseMetadata, StreamResponseMetadata, StreamResult,
};

/// Image URLs the backend fetches itself
const IMAGE_URL_PATTERN: &str = r"^https://example\.com/images/.*";

fn default_supported_urls() -> &'static [SupportedUrl] {
    static URLS: OnceLock<Vec<SupportedUrl>> = OnceLock::new();
    URLS.get_or_init(|| {
        vec![SupportedUrl::new(
            "image/*",
            Regex::new(IMAGE_URL_PATTERN).expect("must be valid regex"),
        )]
    })
}

/// Connection settings shared by every model of a provider
#[derive(Debug)]
struct ChatConfig {
    provider: String,
    completions_url: String,
    stream_url: String,
    api_key: Option<SecretString>,
    api_key_env: String,
    static_headers: HeaderMap,
    framing: StreamFraming,
    client: Client,
}

impl ChatConfig {
    /// Bearer header from the configured key, falling back to the environment
    ///
    /// Resolved per call so a key exported after startup is picked up.
    fn authorization(&self) -> Result<HeaderValue, LlmError> {
        let value = match self.api_key.as_ref().filter(|key| !key.expose_secret().is_empty()) {
            Some(key) => bearer_authorization(key),
            None => {
                let key = std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| LlmError::MissingApiKey {
                        env_var: self.api_key_env.clone(),
                    })?;
                bearer_authorization(&SecretString::from(key))
            }
        };

        value.map_err(|_| LlmError::InvalidSettings("API key is not a valid header value".to_owned()))
    }

    /// Headers for one request: auth, then static headers, then call overrides
    fn headers(&self, overrides: &HeaderOverrides) -> Result<HeaderMap, LlmError> {
        let mut auth = HeaderMap::new();
        auth.insert(AUTHORIZATION, self.authorization()?);

        let mut headers = combine_headers([&auth, &self.static_headers]);
        overrides.apply(&mut headers);

        Ok(headers)
    }
}

/// Factory for chat-completions models backed by one endpoint
#[derive(Debug, Clone)]
pub struct CustomProvider {
    config: Arc<ChatConfig>,
    default_model: String,
    default_settings: ChatSettings,
}

impl CustomProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidSettings` if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::InvalidSettings(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(config, client))
    }

    /// Create with a caller-supplied HTTP client
    pub fn with_client(config: &ProviderConfig, client: Client) -> Self {
        let base = config.base_url.as_str().trim_end_matches('/');
        let completions_url = format!("{base}/chat/completions");
        let stream_url = config
            .stream_url
            .as_ref()
            .map_or_else(|| completions_url.clone(), ToString::to_string);

        let chat_config = ChatConfig {
            provider: config.name.clone(),
            completions_url,
            stream_url,
            api_key: config.api_key.clone(),
            api_key_env: config.api_key_env.clone(),
            static_headers: parse_static_headers(&config.headers),
            framing: config.framing,
            client,
        };

        Self {
            config: Arc::new(chat_config),
            default_model: config.model.clone(),
            default_settings: config.settings.clone(),
        }
    }

    /// Provider label
    pub fn name(&self) -> &str {
        &self.config.provider
    }

    /// Endpoint used for non-streaming calls
    pub fn completions_url(&self) -> &str {
        &self.config.completions_url
    }

    /// Endpoint used for streaming calls
    pub fn stream_url(&self) -> &str {
        &self.config.stream_url
    }

    /// Model `model_id` with the given settings
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidSettings` if the settings would be rejected
    /// by the backend.
    pub fn language_model(&self, model_id: impl Into<String>, settings: ChatSettings) -> Result<ChatLanguageModel, LlmError> {
        settings.validate().map_err(LlmError::InvalidSettings)?;

        Ok(ChatLanguageModel {
            config: Arc::clone(&self.config),
            model_id: model_id.into(),
            settings,
            resolver: Arc::new(UnresolvedFileUrls),
            supported_urls: default_supported_urls().to_vec(),
        })
    }

    /// Model and settings named in the configuration
    pub fn default_model(&self) -> Result<ChatLanguageModel, LlmError> {
        self.language_model(self.default_model.clone(), self.default_settings.clone())
    }
}

/// One model served by a [`CustomProvider`]
#[derive(Clone)]
pub struct ChatLanguageModel {
    config: Arc<ChatConfig>,
    model_id: String,
    settings: ChatSettings,
    resolver: Arc<dyn FileUrlResolver>,
    supported_urls: Vec<SupportedUrl>,
}

impl std::fmt::Debug for ChatLanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatLanguageModel")
            .field("provider", &self.config.provider)
            .field("model_id", &self.model_id)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChatLanguageModel {
    /// Replace how file parts are turned into URLs
    #[must_use]
    pub fn with_file_resolver(mut self, resolver: Arc<dyn FileUrlResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Settings attached at creation
    pub const fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    fn prepare(&self, options: &CallOptions) -> Result<PreparedRequest, LlmError> {
        build_request(&self.model_id, &self.settings, options, self.resolver.as_ref()).map_err(LlmError::from)
    }

    /// POST `body` and return the response if its status is a success
    async fn post(&self, url: &str, body: &ChatRequest, options: &CallOptions) -> Result<reqwest::Response, LlmError> {
        let headers = self.config.headers(&options.headers)?;
        let abort = options.abort_signal.as_ref();

        let request = self.config.client.post(url).headers(headers).json(body).send();

        let response = abortable(abort, request).await?.map_err(|e| {
            tracing::error!(provider = %self.config.provider, error = %e, "upstream request failed");
            LlmError::Connection(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(abortable(abort, classify_response(&self.config.provider, response)).await?);
        }

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for ChatLanguageModel {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn supported_urls(&self) -> &[SupportedUrl] {
        &self.supported_urls
    }

    async fn generate(&self, options: CallOptions) -> Result<GenerateResult, LlmError> {
        let PreparedRequest { body, warnings } = self.prepare(&options)?;

        tracing::debug!(
            provider = %self.config.provider,
            model = %self.model_id,
            messages = body.messages.len(),
            "sending completion request"
        );

        let response = self.post(&self.config.completions_url, &body, &options).await?;
        let headers = response.headers().clone();

        let raw = abortable(options.abort_signal.as_ref(), response.text())
            .await?
            .map_err(|e| LlmError::Connection(format!("failed to read response body: {e}")))?;

        let parsed = parse_response(&raw)?;
        let output = GeneratedOutput::from(&parsed);

        Ok(GenerateResult {
            content: output.content,
            finish_reason: output.finish_reason,
            usage: output.usage,
            warnings,
            request: RequestMetadata { body },
            response: ResponseMetadata { headers, body: parsed },
        })
    }

    async fn stream(&self, options: CallOptions) -> Result<StreamResult, LlmError> {
        let PreparedRequest { mut body, warnings } = self.prepare(&options)?;
        body.stream = Some(true);

        tracing::debug!(
            provider = %self.config.provider,
            model = %self.model_id,
            messages = body.messages.len(),
            "sending streaming completion request"
        );

        let response = self.post(&self.config.stream_url, &body, &options).await?;
        let headers = response.headers().clone();

        let transformer = StreamTransformer::new(self.config.provider.clone(), warnings);
        let mut stream = part_stream(response.bytes_stream(), self.config.framing, transformer);

        if let Some(token) = options.abort_signal {
            stream = with_abort_signal(stream, token);
        }

        Ok(StreamResult {
            stream,
            request: RequestMetadata { body },
            response: StreamResponseMetadata { headers },
        })
    }
}

/// Await `future` unless `abort` fires first
async fn abortable<F: Future>(abort: Option<&CancellationToken>, future: F) -> Result<F::Output, LlmError> {
    let Some(token) = abort else {
        return Ok(future.await);
    };

    tokio::select! {
        biased;
        () = token.cancelled() => Err(LlmError::Aborted),
        output = future => Ok(output),
    }
}
