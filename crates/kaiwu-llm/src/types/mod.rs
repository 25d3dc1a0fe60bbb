//! Canonical, backend-neutral types shared by every adapter stage

pub mod options;
pub mod prompt;
pub mod response;
pub mod stream;

pub use options::CallOptions;
pub use prompt::{ContentPart, DataContent, Message, Prompt, Role};
pub use response::{CallWarning, Content, FinishReason, GenerateResult, RequestMetadata, ResponseMetadata, Usage};
pub use stream::{PartStream, StreamPart, StreamResponseMetadata, StreamResult};
