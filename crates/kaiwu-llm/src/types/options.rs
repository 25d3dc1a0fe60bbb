use kaiwu_core::HeaderOverrides;
use tokio_util::sync::CancellationToken;

use super::prompt::Prompt;

/// Per-call input: the prompt plus sampling and transport options
///
/// Built fresh for every call and never mutated by the adapter.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Conversation to complete
    pub prompt: Prompt,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens
    pub max_output_tokens: Option<u32>,
    /// Sequences that end generation
    pub stop_sequences: Option<Vec<String>>,
    /// Nucleus sampling threshold
    pub top_p: Option<f64>,
    /// Top-k sampling; not accepted by the backend
    pub top_k: Option<u32>,
    /// Presence penalty; not accepted by the backend
    pub presence_penalty: Option<f64>,
    /// Frequency penalty; not accepted by the backend
    pub frequency_penalty: Option<f64>,
    /// Random seed; not accepted by the backend
    pub seed: Option<u64>,
    /// Header overrides applied after the provider headers
    pub headers: HeaderOverrides,
    /// Cooperative cancellation for the request and its stream
    pub abort_signal: Option<CancellationToken>,
}

impl CallOptions {
    /// Options carrying only a prompt
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    #[must_use]
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderOverrides) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_abort_signal(mut self, token: CancellationToken) -> Self {
        self.abort_signal = Some(token);
        self
    }
}
