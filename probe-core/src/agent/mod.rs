//! Agent module: orchestrates the LLM/tool conversation loop.
//!
//! The `Agent` is the core orchestrator: it drives the model, parses tool
//! calls out of its plain-text replies, dispatches them through the tool
//! registry and permission layers, governs output size, compacts history
//! under context pressure, and validates/repairs the final
//! `attempt_completion` payload against an optional schema.

mod builder;
mod persona;
mod repair;
mod run;
mod tools;
mod types;

#[cfg(feature = "mcp")]
mod mcp;

#[cfg(feature = "session")]
mod session;

pub use builder::AgentBuilder;
pub use persona::Persona;
pub use types::{
    AgentError, AgentResponse, TokenUsageStats, ToolCallInfo, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MAX_TOOL_OUTPUT_TOKENS,
};

#[cfg(feature = "session")]
pub use types::SessionInfo;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock as AsyncRwLock;

use crate::events::{AgentEvent, AgentHook, HookId};
use crate::permission::BashPermissionPolicy;
use crate::provider::ModelProvider;
use crate::registry::{AllowedToolSet, ToolRegistry};
use crate::types::Message;

#[cfg(feature = "session")]
use crate::session::SessionStore;

/// Agent that orchestrates interactions between a language model and tools.
///
/// Create an agent using the builder pattern:
///
/// ```ignore
/// use probe_core::Agent;
///
/// #[tokio::main]
/// async fn main() -> probe_core::Result<()> {
///     let agent = Agent::builder()
///         .provider(provider)
///         .with_system_prompt("You are a helpful assistant")
///         .build()
///         .await?;
///
///     let response = agent.run("Hello!").await?;
///     println!("{}", response);
///     Ok(())
/// }
/// ```
pub struct Agent {
    pub(super) provider: Arc<dyn ModelProvider>,
    pub(super) registry: ToolRegistry,
    pub(super) allowed_tools: AllowedToolSet,
    pub(super) bash_policy: BashPermissionPolicy,
    pub(super) system_prompt: Option<String>,
    pub(super) persona: Persona,
    pub(super) max_iterations: usize,
    pub(super) max_tool_output_tokens: usize,
    pub(super) working_directory: PathBuf,
    pub(super) allowed_folders: Vec<PathBuf>,
    pub(super) schema: Option<(Value, bool)>,
    pub(super) disable_json_validation: bool,
    pub(super) disable_mermaid_validation: bool,
    pub(super) session_id: String,

    pub(super) history: AsyncRwLock<Vec<Message>>,
    pub(super) hooks: parking_lot::RwLock<Vec<(HookId, Arc<dyn AgentHook>)>>,
    pub(super) next_hook_id: AtomicU64,

    #[cfg(feature = "mcp")]
    pub(super) mcp_clients: Vec<Arc<crate::mcp::McpClient>>,

    #[cfg(feature = "session")]
    pub(super) session_store: Option<Arc<dyn SessionStore>>,
}

impl Agent {
    /// Start building an agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Add an event hook to observe agent execution. Returns an id that can
    /// later be passed to [`Agent::remove_hook`].
    pub fn add_hook(&self, hook: impl AgentHook + 'static) -> HookId {
        let id = HookId(self.next_hook_id.fetch_add(1, Ordering::SeqCst));
        self.hooks.write().push((id, Arc::new(hook)));
        id
    }

    /// Remove a previously registered hook.
    pub fn remove_hook(&self, id: HookId) {
        self.hooks.write().retain(|(hid, _)| *hid != id);
    }

    pub(crate) fn emit_event(&self, event: AgentEvent) {
        let hooks = self.hooks.read();
        for (_, hook) in hooks.iter() {
            hook.on_event(&event);
        }
    }

    /// Model name for display.
    pub fn model_name(&self) -> &str {
        self.provider.name()
    }

    /// The session id this agent is running under.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// A snapshot of the current conversation history.
    pub async fn history(&self) -> Vec<Message> {
        self.history.read().await.clone()
    }

    /// Gracefully shut down the agent, disconnecting MCP servers.
    pub async fn shutdown(&self) {
        #[cfg(feature = "mcp")]
        for client in &self.mcp_clients {
            let _ = client.disconnect().await;
        }
    }
}
