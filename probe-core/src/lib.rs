//! # Probe
//!
//! The agentic tool-loop core behind the `probe` code-search assistant.
//!
//! This crate owns the hard, model-agnostic machinery that sits between an
//! LLM provider and a set of tools: parsing XML-embedded tool calls out of
//! streamed text, deciding which tools and shell commands a session is
//! allowed to run, keeping tool output and conversation history within a
//! model's context window, validating and self-repairing the final answer
//! against a caller-supplied JSON schema, talking to MCP servers, and
//! noticing when the model is stuck repeating itself.
//!
//! It does not implement an LLM client, the search backend, CLI argument
//! parsing, or an HTTP server — those live one layer up, in `probe-cli` and
//! the concrete [`provider`] implementations.
//!
//! ## Quick Start
//!
//! ```ignore
//! use probe_core::{Agent, provider::AnthropicProvider};
//!
//! #[tokio::main]
//! async fn main() -> probe_core::Result<()> {
//!     let provider = AnthropicProvider::from_env(
//!         "claude-sonnet-4-5-20250929",
//!         "claude-sonnet-4-5",
//!         200_000,
//!         64_000,
//!     )?;
//!
//!     let agent = Agent::builder()
//!         .provider(provider)
//!         .working_dir(".")
//!         .build()
//!         .await?;
//!
//!     let response = agent.run("What does the governor module truncate?").await?;
//!     println!("{}", response);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `anthropic` - Anthropic API provider support
//! - `session` - Session persistence for multi-turn conversations
//! - `mcp` - Model Context Protocol server integration

pub mod agent;
pub mod compaction;
pub mod error;
pub mod events;
pub mod governor;
pub mod parser;
pub mod permission;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod stuck;
pub mod tool;
pub mod types;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "session")]
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentResponse, ToolCallInfo, TokenUsageStats,
    DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOOL_OUTPUT_TOKENS,
};
pub use error::{Error, Result};
pub use events::{AgentEvent, AgentHook, HookId, TokenUsage};
pub use permission::{BashCommand, BashDecision, BashPermissionPolicy, Pattern};
pub use provider::{ModelProvider, ModelResponse, ProviderError, RetryConfig, RetryInfo, StreamEvent};

#[cfg(feature = "anthropic")]
pub use provider::AnthropicProvider;

pub use registry::{AllowedToolSet, ToolDescriptor, ToolExecutor, ToolOutput, ToolRegistry, ToolSourceKind};
pub use tool::{ImageFormat, ToolError, ToolResult};
pub use types::{ContentBlock, Message, Role};

#[cfg(feature = "session")]
pub use agent::SessionInfo;

#[cfg(feature = "session")]
pub use session::{Session, SessionError, SessionStore, SessionSummary};

#[cfg(feature = "mcp")]
pub use mcp::{McpClient, McpConfigFile, McpError, McpServerConfig, McpTransport};
