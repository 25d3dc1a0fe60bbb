//! Chat-completions protocol adapter for Kaiwu
//!
//! Normalizes a third-party chat-completions HTTP API into a vendor-neutral
//! language-model interface: canonical prompts in, canonical results and
//! ordered stream parts out, typed errors on every failure path.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod classify;
pub mod convert;
pub mod error;
#[cfg(feature = "http")]
pub mod handler;
pub mod protocol;
pub mod provider;
pub mod stream;
pub mod types;

pub use error::{ConversionError, LlmError};
#[cfg(feature = "http")]
pub use handler::{ChatState, chat_router};
pub use provider::{ChatLanguageModel, CustomProvider, LanguageModel, SupportedUrl};
pub use types::{
    CallOptions, CallWarning, Content, ContentPart, DataContent, FinishReason, GenerateResult, Message, Prompt, Role,
    StreamPart, StreamResult, Usage,
};
