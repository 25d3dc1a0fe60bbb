use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// resolved, the TOML is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus the file access
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_provider()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_provider(&self) -> anyhow::Result<()> {
        let provider = &self.provider;

        for (field, url) in [("base_url", Some(&provider.base_url)), ("stream_url", provider.stream_url.as_ref())] {
            if let Some(url) = url
                && !matches!(url.scheme(), "http" | "https")
            {
                anyhow::bail!("provider.{field} must use http or https, got '{}'", url.scheme());
            }
        }

        if provider.model.trim().is_empty() {
            anyhow::bail!("provider.model must not be empty");
        }

        if provider.api_key_env.trim().is_empty() {
            anyhow::bail!("provider.api_key_env must not be empty");
        }

        provider
            .settings
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid provider.settings: {e}"))?;

        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        let health = &self.server.health;
        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/', got '{}'", health.path);
        }
        Ok(())
    }
}
