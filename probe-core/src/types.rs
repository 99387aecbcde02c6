//! Provider-agnostic message types.
//!
//! Tool calls are not represented as structured content blocks here — they
//! are parsed out of plain assistant text by [`crate::parser`]. A message is
//! just a role plus a sequence of text/image blocks, matching what a plain
//! completion API actually exchanges.

use serde::{Deserialize, Serialize};

use crate::tool::ImageFormat;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a new system message with text content
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Create a new user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Create a new assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Create a user message carrying a text prompt plus discovered images
    /// (e.g. images a tool result pointed at on disk).
    pub fn user_with_images(text: impl Into<String>, images: Vec<(ImageFormat, String)>) -> Self {
        let mut content = vec![ContentBlock::Text(text.into())];
        content.extend(
            images
                .into_iter()
                .map(|(format, data)| ContentBlock::Image { format, data }),
        );
        Self {
            role: Role::User,
            content,
        }
    }

    /// Get all text content concatenated
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ContentBlock::Text(t) => Some(t.as_str()),
                ContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Whether this message carries any image content blocks
    pub fn has_images(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, ContentBlock::Image { .. }))
    }
}

/// Content block within a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text(String),
    /// Inline image content, base64-encoded in `data`.
    Image {
        format: ImageFormat,
        data: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(format!("{}", Role::System), "system");
        assert_eq!(format!("{}", Role::User), "user");
        assert_eq!(format!("{}", Role::Assistant), "assistant");
    }

    #[test]
    fn test_message_user_creation() {
        let cases = [
            ("simple text", "simple text"),
            ("", ""),
            ("multi\nline", "multi\nline"),
            ("with unicode: 你好 🦀", "with unicode: 你好 🦀"),
        ];

        for (name, input) in cases {
            let msg = Message::user(input);
            assert_eq!(msg.role, Role::User, "case: {}", name);
            assert_eq!(msg.content.len(), 1, "case: {}", name);
            assert_eq!(msg.text(), input, "case: {}", name);
        }
    }

    #[test]
    fn test_message_system_creation() {
        let msg = Message::system("be helpful");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.text(), "be helpful");
    }

    #[test]
    fn test_message_assistant_creation() {
        let msg = Message::assistant("hello");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), "hello");
        assert_eq!(msg.content.len(), 1);
    }

    #[test]
    fn test_message_text_concatenation() {
        let msg = Message {
            role: Role::Assistant,
            content: vec![
                ContentBlock::Text("Hello ".to_string()),
                ContentBlock::Text("world".to_string()),
            ],
        };
        assert_eq!(msg.text(), "Hello world");
    }

    #[test]
    fn test_message_text_empty_content() {
        let msg = Message {
            role: Role::User,
            content: vec![],
        };
        assert_eq!(msg.text(), "");
    }

    #[test]
    fn test_message_user_with_images() {
        let msg = Message::user_with_images(
            "look at this",
            vec![(ImageFormat::Png, "base64data".to_string())],
        );
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "look at this");
        assert!(msg.has_images());
    }

    #[test]
    fn test_message_without_images_has_images_false() {
        let msg = Message::user("plain text");
        assert!(!msg.has_images());
    }
}
