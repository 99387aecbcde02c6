//! Adapts one MCP server's discovered tool into a [`crate::registry::ToolDescriptor`].
//!
//! Every MCP tool is registered under `mcp__<server>__<tool>` (never the
//! server's own namespace convention) and dispatched by forwarding the
//! parsed `<params>{...}</params>` JSON straight through to `tools/call`.

use std::sync::Arc;

use async_trait::async_trait;

use super::client::{McpClient, ToolDefinition};
use crate::parser::ToolParams;
use crate::registry::{ToolDescriptor, ToolExecutor, ToolFlags, ToolOutput, ToolSourceKind};
use crate::tool::ToolError;

struct McpExecutor {
    client: Arc<McpClient>,
    /// The tool's name on the server, without the `mcp__<server>__` prefix.
    remote_name: String,
}

#[async_trait]
impl ToolExecutor for McpExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let arguments = params.as_json();
        let result = self
            .client
            .call_tool(self.remote_name.clone(), arguments)
            .await
            .map_err(|e| ToolError::Custom(format!("mcp tool '{}' failed: {e}", self.remote_name)))?;

        let text = match &result {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        };
        Ok(ToolOutput::text(text))
    }
}

/// Build the registry entry for one tool discovered on `client`.
pub fn build_descriptor(client: Arc<McpClient>, definition: ToolDefinition) -> ToolDescriptor {
    let registered_name = format!("mcp__{}__{}", client.name(), definition.name);
    let xml_description = format!(
        "{}\n\nParameters (JSON Schema):\n{}\n\nUsage:\n<{name}>\n<params>\n{{ ... }}\n</params>\n</{name}>",
        if definition.description.is_empty() {
            "No description provided by the server."
        } else {
            &definition.description
        },
        serde_json::to_string_pretty(&definition.input_schema).unwrap_or_default(),
        name = registered_name,
    );

    ToolDescriptor {
        name: registered_name,
        source: ToolSourceKind::Mcp,
        xml_description,
        params_schema: Some(definition.input_schema.clone()),
        executor: Arc::new(McpExecutor {
            client,
            remote_name: definition.name,
        }),
        flags: ToolFlags::default(),
        primary_param: None,
    }
}
