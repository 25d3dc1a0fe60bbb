#![allow(clippy::must_use_candidate)]

mod env;
mod loader;
pub mod provider;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use provider::*;
pub use server::*;
pub use telemetry::*;

/// Top-level Kaiwu configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Hosting server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream chat-completions backend
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Logging and trace export
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
