//! Anthropic direct API provider implementation
//!
//! This is the default [`ModelProvider`] implementation: it wraps
//! `probe-anthropic-sdk`'s HTTP client, sending whatever messages the agent
//! loop built and returning the assistant's text. It knows nothing about
//! tools — those are plain text as far as this layer is concerned.

mod conversion;

use super::retry::{retry_with_backoff, RetryCallback, RetryConfig, RetryInfo};
use super::{ModelProvider, ModelResponse, ProviderError, StreamEvent};
use crate::events::TokenUsage;
use crate::types::Message;
use conversion::{from_anthropic_message, to_anthropic_message};
use futures::stream::BoxStream;
use futures::StreamExt;
use probe_anthropic_sdk::{
    Anthropic, AnthropicError, ContentBlockDelta, MessageCreateParams, MessageStreamEvent,
};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum tokens to generate
const DEFAULT_MAX_TOKENS: i32 = 4096;

fn classify_anthropic_error(err: &AnthropicError) -> ProviderError {
    match err {
        AnthropicError::Authentication(msg) => ProviderError::Authentication(msg.clone()),
        AnthropicError::RateLimited(msg) => ProviderError::RateLimited(msg.clone()),
        AnthropicError::ServiceUnavailable(msg) => ProviderError::ServiceUnavailable(msg.clone()),
        AnthropicError::InvalidRequest(msg) => ProviderError::Configuration(msg.clone()),
        AnthropicError::InvalidResponse(msg) => {
            ProviderError::Other(format!("Invalid response: {}", msg))
        }
        AnthropicError::Model(msg) => ProviderError::Model(msg.clone()),
        AnthropicError::Network(msg) => ProviderError::Network(msg.clone()),
        AnthropicError::Configuration(msg) => ProviderError::Configuration(msg.clone()),
        AnthropicError::Json(e) => ProviderError::Other(format!("JSON error: {}", e)),
        AnthropicError::Stream(msg) => ProviderError::Other(format!("Stream error: {}", msg)),
        AnthropicError::Other(msg) => ProviderError::Other(msg.clone()),
    }
}

/// Anthropic direct API model provider.
///
/// ```ignore
/// use probe_core::AnthropicProvider;
///
/// let provider = AnthropicProvider::from_env(
///     "claude-sonnet-4-5-20250929",
///     "Claude Sonnet 4.5",
///     200_000,
///     64_000,
/// )?;
/// ```
pub struct AnthropicProvider {
    client: Anthropic,
    model_id: String,
    model_name: String,
    max_context_tokens: usize,
    max_output_tokens: usize,
    max_tokens: i32,
    temperature: Option<f32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    retry_config: RetryConfig,
    on_retry: Option<RetryCallback>,
}

impl Clone for AnthropicProvider {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            model_id: self.model_id.clone(),
            model_name: self.model_name.clone(),
            max_context_tokens: self.max_context_tokens,
            max_output_tokens: self.max_output_tokens,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            retry_config: self.retry_config.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl AnthropicProvider {
    /// Create a provider using `ANTHROPIC_API_KEY` from the environment.
    pub fn from_env(
        model_id: impl Into<String>,
        model_name: impl Into<String>,
        max_context_tokens: usize,
        max_output_tokens: usize,
    ) -> Result<Self, ProviderError> {
        let client = Anthropic::from_env().map_err(|e| classify_anthropic_error(&e))?;
        Ok(Self::with_client(
            client,
            model_id,
            model_name,
            max_context_tokens,
            max_output_tokens,
        ))
    }

    /// Create a provider with an explicit API key.
    pub fn new(
        api_key: impl Into<String>,
        model_id: impl Into<String>,
        model_name: impl Into<String>,
        max_context_tokens: usize,
        max_output_tokens: usize,
    ) -> Result<Self, ProviderError> {
        let client = Anthropic::new(api_key).map_err(|e| classify_anthropic_error(&e))?;
        Ok(Self::with_client(
            client,
            model_id,
            model_name,
            max_context_tokens,
            max_output_tokens,
        ))
    }

    fn with_client(
        client: Anthropic,
        model_id: impl Into<String>,
        model_name: impl Into<String>,
        max_context_tokens: usize,
        max_output_tokens: usize,
    ) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            model_name: model_name.into(),
            max_context_tokens,
            max_output_tokens,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            top_p: None,
            top_k: None,
            retry_config: RetryConfig::default(),
            on_retry: None,
        }
    }

    /// Set the maximum number of tokens to generate per request
    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature (0.0 to 1.0)
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top_p (0.0 to 1.0)
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set top_k (only sample from the top K options)
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Configure retry behavior for transient errors (throttling, rate limits)
    ///
    /// Default: 8 attempts with exponential backoff starting at 500ms, capped at 30s
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Set the maximum number of retry attempts for transient errors
    pub fn with_max_retries(mut self, attempts: usize) -> Self {
        self.retry_config.max_attempts = attempts;
        self
    }

    /// Set the maximum delay between retries
    pub fn with_max_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_config.max_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the base delay for exponential backoff
    pub fn with_base_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_config.base_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set a callback to be notified when retries occur
    pub fn with_retry_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(RetryInfo) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    fn build_params(
        &self,
        messages: Vec<probe_anthropic_sdk::MessageParam>,
        system_prompt: Option<String>,
    ) -> MessageCreateParams {
        let mut builder =
            MessageCreateParams::builder(&self.model_id, self.max_tokens as u32).messages(messages);

        if let Some(system) = system_prompt {
            builder = builder.system(system);
        }
        if let Some(temp) = self.temperature {
            builder = builder.temperature(temp);
        }
        if let Some(top_p) = self.top_p {
            builder = builder.top_p(top_p);
        }
        if let Some(top_k) = self.top_k {
            builder = builder.top_k(top_k);
        }

        builder.build()
    }
}

#[async_trait::async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn max_context_tokens(&self) -> usize {
        self.max_context_tokens
    }

    fn max_output_tokens(&self) -> usize {
        self.max_output_tokens
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError> {
        let anthropic_messages: Vec<probe_anthropic_sdk::MessageParam> = messages
            .iter()
            .map(to_anthropic_message)
            .collect::<Result<Vec<_>, _>>()?;

        let params = self.build_params(anthropic_messages, system_prompt);

        let response = retry_with_backoff(
            || async {
                self.client
                    .messages()
                    .create(params.clone())
                    .await
                    .map_err(|e| classify_anthropic_error(&e))
            },
            &self.retry_config,
            &self.on_retry,
        )
        .await?;

        let message = from_anthropic_message(&response);
        let usage = Some(TokenUsage {
            input_tokens: response.usage.input_tokens as usize,
            output_tokens: response.usage.output_tokens as usize,
        });

        Ok(ModelResponse { message, usage })
    }

    async fn generate_stream(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<String>,
    ) -> Result<BoxStream<'static, Result<StreamEvent, ProviderError>>, ProviderError> {
        let anthropic_messages: Vec<probe_anthropic_sdk::MessageParam> = messages
            .iter()
            .map(to_anthropic_message)
            .collect::<Result<Vec<_>, _>>()?;

        let params = self.build_params(anthropic_messages, system_prompt);

        let stream = retry_with_backoff(
            || async {
                self.client
                    .messages()
                    .stream(params.clone())
                    .await
                    .map_err(|e| classify_anthropic_error(&e))
            },
            &self.retry_config,
            &self.on_retry,
        )
        .await?;

        let event_stream = async_stream::stream! {
            let mut stream = stream;
            let mut input_tokens: usize = 0;
            let mut output_tokens: usize = 0;

            while let Some(event_result) = stream.next().await {
                match event_result {
                    Ok(event) => match event {
                        MessageStreamEvent::MessageStart { message } => {
                            input_tokens = message.usage.input_tokens as usize;
                        }
                        MessageStreamEvent::ContentBlockDelta { delta, .. } => match delta {
                            ContentBlockDelta::TextDelta { text } => {
                                yield Ok(StreamEvent::TextDelta(text));
                            }
                            ContentBlockDelta::ThinkingDelta { thinking } => {
                                yield Ok(StreamEvent::ThinkingDelta(thinking));
                            }
                            ContentBlockDelta::InputJsonDelta { .. }
                            | ContentBlockDelta::SignatureDelta { .. } => {}
                        },
                        MessageStreamEvent::MessageStop => break,
                        MessageStreamEvent::MessageDelta { usage, .. } => {
                            if let Some(u) = usage {
                                output_tokens = u.output_tokens as usize;
                            }
                        }
                        _ => {}
                    },
                    Err(e) => {
                        yield Err(classify_anthropic_error(&e));
                        break;
                    }
                }
            }

            yield Ok(StreamEvent::Stop {
                usage: Some(TokenUsage { input_tokens, output_tokens }),
            });
        };

        Ok(Box::pin(event_stream))
    }
}
