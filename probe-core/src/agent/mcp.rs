//! MCP multiplexer wiring: connect every configured server, list its tools,
//! and register each one into the agent's [`ToolRegistry`] under the
//! `mcp__<server>__<tool>` naming scheme.

use std::sync::Arc;

use crate::mcp::tool_adapter::build_descriptor;
use crate::mcp::{load_config_file, McpClient, McpServerConfig};
use crate::registry::ToolRegistry;

/// Connect to every server (explicit configs first, then servers discovered
/// from config files) and register their tools. Returns the connected
/// clients so the agent can disconnect them on shutdown.
pub(super) async fn connect_servers(
    registry: &mut ToolRegistry,
    servers: Vec<McpServerConfig>,
    config_files: Vec<std::path::PathBuf>,
) -> Result<Vec<Arc<McpClient>>, crate::error::Error> {
    let mut all_configs = servers;
    for path in config_files {
        let discovered = load_config_file(&path)
            .await
            .map_err(|e| crate::error::Error::Mcp(e.to_string()))?;
        all_configs.extend(discovered);
    }

    let mut clients = Vec::with_capacity(all_configs.len());
    for config in all_configs {
        let client = Arc::new(
            McpClient::new(config.clone()).map_err(|e| crate::error::Error::Mcp(e.to_string()))?,
        );
        let tools = client
            .list_tools()
            .await
            .map_err(|e| crate::error::Error::Mcp(e.to_string()))?;

        for definition in tools {
            if config.should_include_tool(&definition.name) {
                registry.register(build_descriptor(Arc::clone(&client), definition));
            }
        }
        clients.push(client);
    }

    Ok(clients)
}
