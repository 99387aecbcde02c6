//! Token counting types for the Anthropic Messages API
//!
//! This module contains types for the token counting endpoint,
//! which allows you to count tokens before making a request.
//!
//! # Example
//!
//! ```no_run
//! // Requires ANTHROPIC_API_KEY environment variable
//! use probe_anthropic_sdk::{Anthropic, CountTokensParams, MessageParam};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Anthropic::from_env()?;
//!
//! let params = CountTokensParams {
//!     model: "claude-sonnet-4-20250514".to_string(),
//!     messages: vec![MessageParam::user("Hello!")],
//!     system: None,
//!     tools: None,
//! };
//!
//! let response = client.messages().count_tokens(params).await?;
//! println!("Input tokens: {}", response.input_tokens);
//! # Ok(())
//! # }
//! ```

use crate::messages::MessageParam;
use crate::tools::Tool;
use serde::{Deserialize, Serialize};

/// Parameters for counting tokens
#[derive(Debug, Clone, Serialize)]
pub struct CountTokensParams {
    /// The model to use for tokenization
    pub model: String,

    /// The messages to count tokens for
    pub messages: Vec<MessageParam>,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Tools (optional) - included in token count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl CountTokensParams {
    /// Create a builder for CountTokensParams
    ///
    /// # Example
    ///
    /// ```
    /// use probe_anthropic_sdk::{CountTokensParams, MessageParam};
    ///
    /// let params = CountTokensParams::builder("claude-sonnet-4-20250514")
    ///     .messages(vec![MessageParam::user("Hello!")])
    ///     .system("You are helpful")
    ///     .build();
    /// ```
    pub fn builder(model: impl Into<String>) -> CountTokensParamsBuilder {
        CountTokensParamsBuilder::new(model)
    }
}

/// Builder for CountTokensParams
#[derive(Debug, Clone)]
pub struct CountTokensParamsBuilder {
    model: String,
    messages: Vec<MessageParam>,
    system: Option<String>,
    tools: Option<Vec<Tool>>,
}

impl CountTokensParamsBuilder {
    /// Create a new builder with the required model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            tools: None,
        }
    }

    /// Append messages to count tokens for
    ///
    /// Uses extend semantics: messages are added to any existing messages,
    /// matching the behavior of [`crate::MessageCreateParamsBuilder::messages`].
    pub fn messages(mut self, messages: impl IntoIterator<Item = MessageParam>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Add a single message
    pub fn message(mut self, message: MessageParam) -> Self {
        self.messages.push(message);
        self
    }

    /// Add a user message
    pub fn user(mut self, content: impl Into<crate::messages::MessageContent>) -> Self {
        self.messages.push(MessageParam::user(content));
        self
    }

    /// Add an assistant message
    pub fn assistant(mut self, content: impl Into<crate::messages::MessageContent>) -> Self {
        self.messages.push(MessageParam::assistant(content));
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the tools
    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Build the CountTokensParams
    pub fn build(self) -> CountTokensParams {
        CountTokensParams {
            model: self.model,
            messages: self.messages,
            system: self.system,
            tools: self.tools,
        }
    }
}

/// Response from the token counting API
#[derive(Debug, Clone, Deserialize)]
pub struct CountTokensResponse {
    /// Number of input tokens
    pub input_tokens: u32,
}

// ============================================================================
// Tests
// ============================================================================
