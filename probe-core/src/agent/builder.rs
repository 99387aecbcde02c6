//! Fluent builder for [`Agent`].

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock as AsyncRwLock;

use crate::error::{Error, Result};
use crate::permission::BashPermissionPolicy;
use crate::provider::ModelProvider;
use crate::registry::{AllowedToolSet, ToolDescriptor, ToolRegistry};

use super::persona::Persona;
use super::repair::attempt_completion_descriptor;
use super::types::{DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOOL_OUTPUT_TOKENS};
use super::Agent;

#[cfg(feature = "mcp")]
use crate::mcp::McpServerConfig;

#[cfg(feature = "session")]
use crate::session::SessionStore;

/// Builds an [`Agent`]. Obtain one via [`Agent::builder`].
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn ModelProvider>>,
    registry: ToolRegistry,
    allowed_tools: AllowedToolSet,
    bash_policy: BashPermissionPolicy,
    system_prompt: Option<String>,
    max_iterations: Option<usize>,
    max_tool_output_tokens: Option<usize>,
    working_directory: Option<PathBuf>,
    allowed_folders: Vec<PathBuf>,
    schema: Option<(Value, bool)>,
    disable_json_validation: bool,
    disable_mermaid_validation: bool,

    #[cfg(feature = "mcp")]
    mcp_servers: Vec<McpServerConfig>,
    #[cfg(feature = "mcp")]
    mcp_config_files: Vec<PathBuf>,

    #[cfg(feature = "session")]
    session_store: Option<Arc<dyn SessionStore>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the model provider. Accepts any [`ModelProvider`] by value
    /// (it is wrapped in an `Arc` internally).
    pub fn provider(mut self, provider: impl ModelProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// The directory the agent operates in. Tools that touch the filesystem
    /// are confined to this directory plus [`Self::allow_folder`] additions.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Grant access to an additional folder outside the working directory.
    pub fn allow_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.allowed_folders.push(dir.into());
        self
    }

    /// Append a fragment to the persona preamble in the system message.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Override the default iteration ceiling ([`DEFAULT_MAX_ITERATIONS`]).
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Override the default per-tool-result token ceiling
    /// ([`DEFAULT_MAX_TOOL_OUTPUT_TOKENS`]) the output governor enforces.
    pub fn with_max_tool_output_tokens(mut self, max: usize) -> Self {
        self.max_tool_output_tokens = Some(max);
        self
    }

    /// Restrict which registered tools the model may call.
    pub fn with_allowed_tools(mut self, allowed: AllowedToolSet) -> Self {
        self.allowed_tools = allowed;
        self
    }

    /// Override the default shell permission policy.
    pub fn with_bash_policy(mut self, policy: BashPermissionPolicy) -> Self {
        self.bash_policy = policy;
        self
    }

    /// Require `attempt_completion`'s result to validate against a JSON
    /// Schema, with bounded self-repair on failure. `strict` additionally
    /// injects `additionalProperties: false` throughout the schema.
    pub fn with_schema(mut self, schema: Value, strict: bool) -> Self {
        self.schema = Some((schema, strict));
        self
    }

    /// Disable JSON schema validation/self-repair outright. Used internally
    /// to build isolated repair sub-agents; exposed for callers who want a
    /// schema on record (e.g. for documentation) without enforcing it.
    pub fn disable_json_validation(mut self) -> Self {
        self.disable_json_validation = true;
        self
    }

    /// Disable Mermaid diagram validation/self-repair.
    pub fn disable_mermaid_validation(mut self) -> Self {
        self.disable_mermaid_validation = true;
        self
    }

    /// Register one tool.
    pub fn add_tool(mut self, descriptor: ToolDescriptor) -> Self {
        self.registry.register(descriptor);
        self
    }

    /// Register several tools.
    pub fn add_tools(mut self, descriptors: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        for descriptor in descriptors {
            self.registry.register(descriptor);
        }
        self
    }

    /// Add an MCP server; it is connected when [`Self::build`] runs.
    #[cfg(feature = "mcp")]
    pub fn with_mcp_server(mut self, config: McpServerConfig) -> Self {
        self.mcp_servers.push(config);
        self
    }

    /// Load MCP server configuration from a Claude Desktop/Code-style JSON
    /// file; servers are connected when [`Self::build`] runs.
    #[cfg(feature = "mcp")]
    pub fn with_mcp_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.mcp_config_files.push(path.into());
        self
    }

    /// Persist conversation history across runs through this store.
    #[cfg(feature = "session")]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Finish configuration, connecting any configured MCP servers.
    pub async fn build(mut self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| Error::Config("no model provider configured; call .provider(...)".to_string()))?;

        if self.registry.get("attempt_completion").is_none() {
            self.registry.register(attempt_completion_descriptor());
        }

        #[cfg(feature = "mcp")]
        let mcp_clients = super::mcp::connect_servers(
            &mut self.registry,
            self.mcp_servers,
            self.mcp_config_files,
        )
        .await?;

        Ok(Agent {
            provider,
            registry: self.registry,
            allowed_tools: self.allowed_tools,
            bash_policy: self.bash_policy,
            system_prompt: self.system_prompt,
            persona: Persona::CodeSearch,
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            max_tool_output_tokens: self
                .max_tool_output_tokens
                .unwrap_or(DEFAULT_MAX_TOOL_OUTPUT_TOKENS),
            working_directory: self.working_directory.unwrap_or_else(|| PathBuf::from(".")),
            allowed_folders: self.allowed_folders,
            schema: self.schema,
            disable_json_validation: self.disable_json_validation,
            disable_mermaid_validation: self.disable_mermaid_validation,
            session_id: uuid::Uuid::new_v4().to_string(),
            history: AsyncRwLock::new(Vec::new()),
            hooks: parking_lot::RwLock::new(Vec::new()),
            next_hook_id: AtomicU64::new(0),
            #[cfg(feature = "mcp")]
            mcp_clients,
            #[cfg(feature = "session")]
            session_store: self.session_store,
        })
    }
}
