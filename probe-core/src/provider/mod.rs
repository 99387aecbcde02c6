//! Model providers for LLM interactions
//!
//! This module contains the `ModelProvider` trait and its implementations.
//! Tool calls are not a first-class concept at this layer: a provider sends
//! plain messages and gets plain text back. The agent loop is the one that
//! finds a tool call by parsing that text (see [`crate::parser`]).

#[cfg(feature = "anthropic")]
pub mod anthropic;
pub mod retry;

use crate::events::TokenUsage;
use crate::types::Message;
use futures::stream::BoxStream;
use std::error::Error;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;
pub use retry::{RetryCallback, RetryConfig, RetryInfo};

/// The assistant's reply to a `generate` call: plain text plus whatever
/// usage accounting the provider reported.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The assistant's response message (always a single `Text` block)
    pub message: Message,
    /// Token usage statistics, if the provider reported any
    pub usage: Option<TokenUsage>,
}

/// Events from a streaming model response
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Incremental text delta
    TextDelta(String),
    /// Incremental thinking delta (extended thinking)
    ThinkingDelta(String),
    /// Streaming stopped
    Stop {
        /// Token usage for this response (if available)
        usage: Option<TokenUsage>,
    },
}

/// Error types for model providers
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication or authorization failed (expired tokens, invalid credentials, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting or throttling
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network or connectivity issues
    #[error("Network error: {0}")]
    Network(String),

    /// Model-specific errors (content filtered, context too long, etc.)
    #[error("Model error: {0}")]
    Model(String),

    /// Service unavailable or temporary issues
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Invalid configuration (bad model ID, missing parameters, etc.)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Other provider-specific errors that don't fit above categories
    #[error("{0}")]
    Other(String),

    /// Communication error (legacy, kept for compatibility)
    #[error("Communication error: {0}")]
    Communication(#[from] Box<dyn Error + Send + Sync>),
}

/// Trait for LLM backends.
///
/// A provider is deliberately thin: it turns a list of messages plus an
/// optional system prompt into a text completion. It knows nothing about
/// tools, XML dialects, or the agent loop — those live in
/// [`crate::parser`] and [`crate::agent`].
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Get the model name for display (e.g., "Claude Sonnet 4.5")
    fn name(&self) -> &str;

    /// Maximum input context tokens for this model
    fn max_context_tokens(&self) -> usize;

    /// Maximum output tokens this model can generate
    fn max_output_tokens(&self) -> usize;

    /// Estimate token count for text
    ///
    /// Providers should implement this to match their model's tokenization.
    /// Default implementation uses a ~4 characters per token heuristic.
    fn estimate_token_count(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }

    /// Estimate token count for a conversation
    fn estimate_message_tokens(&self, messages: &[Message]) -> usize {
        let mut total = 0;
        for message in messages {
            total += 4; // Role overhead
            total += self.estimate_token_count(&message.text());
        }
        total
    }

    /// Send a request to the model and get a complete response.
    async fn generate(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError>;

    /// Send a request and stream the response token-by-token (optional).
    ///
    /// The default implementation calls [`Self::generate`] and replays it
    /// as a single-shot stream, so providers without native streaming
    /// support still satisfy the trait.
    async fn generate_stream(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<String>,
    ) -> Result<BoxStream<'static, Result<StreamEvent, ProviderError>>, ProviderError> {
        let response = self.generate(messages, system_prompt).await?;
        let text = response.message.text();

        let mut events = Vec::new();
        if !text.is_empty() {
            events.push(Ok(StreamEvent::TextDelta(text)));
        }
        events.push(Ok(StreamEvent::Stop {
            usage: response.usage,
        }));

        Ok(Box::pin(futures::stream::iter(events)))
    }
}

#[async_trait::async_trait]
impl ModelProvider for std::sync::Arc<dyn ModelProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_context_tokens(&self) -> usize {
        (**self).max_context_tokens()
    }

    fn max_output_tokens(&self) -> usize {
        (**self).max_output_tokens()
    }

    fn estimate_token_count(&self, text: &str) -> usize {
        (**self).estimate_token_count(text)
    }

    fn estimate_message_tokens(&self, messages: &[Message]) -> usize {
        (**self).estimate_message_tokens(messages)
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError> {
        (**self).generate(messages, system_prompt).await
    }

    async fn generate_stream(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<String>,
    ) -> Result<BoxStream<'static, Result<StreamEvent, ProviderError>>, ProviderError> {
        (**self).generate_stream(messages, system_prompt).await
    }
}
