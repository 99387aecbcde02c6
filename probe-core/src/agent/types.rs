//! Agent-related types

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::parser::ParseError;
use crate::provider::ProviderError;
use crate::schema::SchemaError;
use crate::tool::ToolError;

#[cfg(feature = "session")]
use crate::session::SessionError;

/// Errors that can occur during agent execution
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model provider errors (API calls, authentication, rate limits)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Session storage errors
    #[cfg(feature = "session")]
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Model returned no text response
    #[error("Model returned no text response")]
    NoResponse,

    /// The assistant's reply could not be parsed as a tool call after the
    /// corrective synthetic turn failed a second time (see the XML tool-call
    /// parser's recovery path).
    #[error("Failed to parse tool call: {0}")]
    Parse(#[from] ParseError),

    /// The requested tool is not excluded by name/glob but simply doesn't
    /// exist in the registry.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution was denied structurally: the tool name fell outside
    /// the session's `AllowedToolSet`, or a `bash` command string was
    /// rejected by the `BashPermissionPolicy`. There is no interactive
    /// approval step to retry here — denial is final for that turn.
    #[error("Tool execution denied: {0}")]
    ToolDenied(String),

    /// The loop reached `max_iterations` without the model calling
    /// `attempt_completion`.
    #[error("Reached the iteration limit ({0}) without a final answer")]
    IterationLimitExceeded(usize),

    /// Two consecutive assistant turns were both classified as a stuck
    /// admission of inability to proceed (see [`crate::stuck`]).
    #[error("Agent appears stuck: {0}")]
    StuckLoop(String),

    /// `attempt_completion`'s result failed schema validation and the
    /// bounded self-repair sub-agent also failed to produce a conforming
    /// response.
    #[error("Schema validation failed: {0}")]
    SchemaValidation(#[from] SchemaError),

    /// Response was filtered by content moderation
    #[error("Response was filtered by content moderation")]
    ContentFiltered,
}

/// Information about the current session
#[cfg(feature = "session")]
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session ID
    pub id: String,
    /// Directory where session is active
    pub directory: String,
    /// Number of messages in session
    pub message_count: usize,
    /// When session was created
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last update time
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Default maximum number of loop iterations before giving up
pub const DEFAULT_MAX_ITERATIONS: usize = 30;

/// Default ceiling (in estimated tokens) on a single tool result before the
/// output governor spills it to disk
pub const DEFAULT_MAX_TOOL_OUTPUT_TOKENS: usize = 20_000;

/// Response from Agent.run() containing the result and execution statistics
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The final text response from the agent
    pub text: String,
    /// All tool calls made during this run
    pub tool_calls: Vec<ToolCallInfo>,
    /// Total token usage across all model calls (if available)
    pub token_usage: Option<TokenUsageStats>,
    /// Total execution time
    pub duration: Duration,
    /// Number of model calls made (includes retries after tool use)
    pub model_calls: usize,
}

impl AgentResponse {
    /// Get just the text response
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<AgentResponse> for String {
    fn from(response: AgentResponse) -> Self {
        response.text
    }
}

impl PartialEq<&str> for AgentResponse {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

/// Information about a tool call made during agent execution
#[derive(Debug, Clone)]
pub struct ToolCallInfo {
    /// Tool name
    pub name: String,
    /// Input parameters (as JSON)
    pub input: Value,
    /// Output from the tool
    pub output: String,
    /// Whether the tool succeeded
    pub success: bool,
    /// Execution duration
    pub duration: Duration,
}

/// Cumulative token usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsageStats {
    /// Total input tokens across all model calls
    pub input_tokens: usize,
    /// Total output tokens across all model calls
    pub output_tokens: usize,
}

impl TokenUsageStats {
    /// Total tokens (input + output)
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}
