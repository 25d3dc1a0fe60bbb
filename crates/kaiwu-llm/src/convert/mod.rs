//! Translation between canonical types and the chat-completions wire format

pub mod finish_reason;
pub mod messages;
pub mod request;
pub mod response;

pub use finish_reason::map_finish_reason;
pub use messages::{FileUrlResolver, UnresolvedFileUrls, convert_messages};
pub use request::{PreparedRequest, build_request};
pub use response::{GeneratedOutput, parse_response};
