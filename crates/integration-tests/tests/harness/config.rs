//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use kaiwu_config::{ChatSettings, Config, StreamFraming};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Provider pointed at `base_url` with a fixed API key
    pub fn new(base_url: &str) -> Self {
        let mut config = Config::default();
        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        config.provider.base_url = base_url.parse().expect("valid URL");
        config.provider.api_key = Some(SecretString::from("test-key"));
        config.provider.model = "mock-model".to_owned();

        Self { config }
    }

    /// Set how the streaming body is framed
    pub fn with_framing(mut self, framing: StreamFraming) -> Self {
        self.config.provider.framing = framing;
        self
    }

    /// Send streaming calls to a separate endpoint
    pub fn with_stream_url(mut self, url: &str) -> Self {
        self.config.provider.stream_url = Some(url.parse().expect("valid URL"));
        self
    }

    /// Add a static upstream header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.config.provider.headers.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Attach per-model settings
    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.config.provider.settings = settings;
        self
    }

    /// Drop the configured key so it is read from `env_var` at call time
    pub fn with_api_key_env(mut self, env_var: &str) -> Self {
        self.config.provider.api_key = None;
        self.config.provider.api_key_env = env_var.to_owned();
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
