//! Canonical prompt -> chat-completions messages

use crate::error::ConversionError;
use crate::protocol::chat::{ChatContentPart, ChatImageUrl, ChatMessage};
use crate::types::{ContentPart, DataContent, Message, Role};

/// Turns file data into a URL the backend can fetch
pub trait FileUrlResolver: Send + Sync {
    /// URL for the file; an empty string is passed through as-is
    fn resolve(&self, data: &DataContent, media_type: &str) -> String;
}

/// Resolver used until file upload exists: every file maps to an empty URL
#[derive(Debug, Clone, Copy, Default)]
pub struct UnresolvedFileUrls;

impl FileUrlResolver for UnresolvedFileUrls {
    fn resolve(&self, _data: &DataContent, media_type: &str) -> String {
        tracing::debug!(media_type, "file upload not available, sending empty image URL");
        String::new()
    }
}

/// Convert a prompt into wire messages
///
/// Fails on the first message or part that has no translation; nothing is
/// dropped silently.
pub fn convert_messages(prompt: &[Message], resolver: &dyn FileUrlResolver) -> Result<Vec<ChatMessage>, ConversionError> {
    prompt.iter().map(|message| convert_message(message, resolver)).collect()
}

fn convert_message(message: &Message, resolver: &dyn FileUrlResolver) -> Result<ChatMessage, ConversionError> {
    match message {
        Message::System { content } => Ok(ChatMessage::System {
            content: content.clone(),
        }),
        Message::User { content } => {
            let parts = content
                .iter()
                .map(|part| convert_user_part(part, resolver))
                .collect::<Result<_, _>>()?;
            Ok(ChatMessage::User { content: parts })
        }
        // Earlier model turns and tool results have no wire form on this backend
        Message::Assistant { .. } | Message::Tool { .. } => {
            Err(ConversionError::UnsupportedRole { role: message.role() })
        }
    }
}

fn convert_user_part(part: &ContentPart, resolver: &dyn FileUrlResolver) -> Result<ChatContentPart, ConversionError> {
    match part {
        ContentPart::Text { text } => Ok(ChatContentPart::Text { text: text.clone() }),
        ContentPart::File { data, media_type, .. } => Ok(ChatContentPart::ImageUrl {
            image_url: ChatImageUrl {
                url: resolver.resolve(data, media_type),
            },
        }),
        ContentPart::Reasoning { .. } | ContentPart::ToolCall { .. } | ContentPart::ToolResult { .. } => {
            Err(ConversionError::UnsupportedPart {
                role: Role::User,
                part_type: part.part_type(),
            })
        }
    }
}
