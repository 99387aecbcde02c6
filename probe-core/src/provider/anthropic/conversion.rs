//! Type conversions between probe's plain message model and the Anthropic SDK's.
//!
//! There are no tool-use content blocks to convert here: tool calls travel as
//! XML embedded in plain assistant text (see [`crate::parser`]), so a
//! [`Message`] only ever carries [`ContentBlock::Text`] and
//! [`ContentBlock::Image`].

use super::ProviderError;
use crate::tool::ImageFormat;
use crate::types::{ContentBlock, Message, Role};
use probe_anthropic_sdk::{
    ContentBlock as AnthropicContentBlock, ContentBlockParam, ImageSource,
    Message as AnthropicMessage, MessageContent, MessageParam, Role as AnthropicRole,
};

pub fn to_anthropic_message(msg: &Message) -> Result<MessageParam, ProviderError> {
    let role = match msg.role {
        Role::User => AnthropicRole::User,
        Role::Assistant => AnthropicRole::Assistant,
        Role::System => {
            return Err(ProviderError::Configuration(
                "system messages are carried via the system prompt, not the message list".into(),
            ))
        }
    };

    let content: Vec<ContentBlockParam> = msg.content.iter().map(to_anthropic_block).collect();

    Ok(MessageParam {
        role,
        content: MessageContent::Blocks(content),
    })
}

fn to_anthropic_block(block: &ContentBlock) -> ContentBlockParam {
    match block {
        ContentBlock::Text(text) => ContentBlockParam::Text {
            text: text.clone(),
            cache_control: None,
        },
        ContentBlock::Image { format, data } => ContentBlockParam::Image {
            source: ImageSource::Base64 {
                media_type: image_format_to_media_type(*format),
                data: data.clone(),
            },
            cache_control: None,
        },
    }
}

fn image_format_to_media_type(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Webp => "image/webp",
    }
    .to_string()
}

/// Flatten an Anthropic response into the plain text block probe deals in.
///
/// Anything that isn't plain text (thinking, server tool use, ...) is
/// dropped: the agent loop only ever looks at the assistant's rendered text
/// to find an embedded tool call.
pub fn from_anthropic_message(msg: &AnthropicMessage) -> Message {
    let text: String = msg
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    Message::assistant(text)
}
