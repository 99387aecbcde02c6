use super::{McpError, McpServerConfig, McpTransport};
use rmcp::service::RunningService;
use rmcp::transport::streamable_http_client::{
    StreamableHttpClientTransport, StreamableHttpClientTransportConfig,
};
use rmcp::transport::TokioChildProcess;
use rmcp::{model::CallToolRequestParam, RoleClient, ServiceExt};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::RwLock;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// MCP client wrapper that provides lazy connection and tool access
pub struct McpClient {
    name: String,
    config: McpServerConfig,
    service: Arc<RwLock<Option<RunningService<RoleClient, ()>>>>,
}

impl McpClient {
    /// Create a new MCP client from configuration
    ///
    /// The client is not connected until `connect()` is called or a method that requires
    /// connection is invoked (lazy connection pattern).
    pub fn new(config: McpServerConfig) -> Result<Self, McpError> {
        Ok(Self {
            name: config.name.clone(),
            config,
            service: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the server name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connect to the MCP server
    ///
    /// This method is idempotent - calling it multiple times is safe and will not
    /// create multiple connections.
    pub async fn connect(&self) -> Result<(), McpError> {
        let mut service_guard = self.service.write().await;

        // Already connected
        if service_guard.is_some() {
            return Ok(());
        }

        // Create the service based on transport type
        let service: RunningService<RoleClient, ()> = match &self.config.transport {
            McpTransport::Stdio { command, args, env } => {
                let mut cmd = Command::new(command);

                // Add arguments
                for arg in args {
                    cmd.arg(arg);
                }

                // Add environment variables
                for (key, value) in env {
                    cmd.env(key, value);
                }

                // Create transport and serve
                let transport = TokioChildProcess::new(cmd).map_err(|e| {
                    McpError::Transport(format!("Failed to create child process: {}", e))
                })?;

                ().serve(transport).await.map_err(|e| {
                    McpError::Connection(format!("Failed to connect to server: {}", e))
                })?
            }
            McpTransport::Http { url, headers } => {
                // Create HTTP transport config
                let config = StreamableHttpClientTransportConfig::with_uri(url.clone());

                // Build reqwest client with custom headers
                let mut header_map = HeaderMap::new();
                for (key, value) in headers {
                    let header_name = HeaderName::try_from(key.as_str()).map_err(|e| {
                        McpError::Config(format!("Invalid header name '{}': {}", key, e))
                    })?;
                    let header_value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                        McpError::Config(format!("Invalid header value for '{}': {}", key, e))
                    })?;
                    header_map.insert(header_name, header_value);
                }

                let http_client = reqwest::Client::builder()
                    .default_headers(header_map)
                    .build()
                    .map_err(|e| {
                        McpError::Transport(format!("Failed to create HTTP client: {}", e))
                    })?;

                // Create transport with custom client
                let transport = StreamableHttpClientTransport::with_client(http_client, config);

                ().serve(transport).await.map_err(|e| {
                    McpError::Connection(format!("Failed to connect to HTTP server: {}", e))
                })?
            }
        };

        *service_guard = Some(service);
        Ok(())
    }

    /// Ensure the client is connected (lazy connect)
    async fn ensure_connected(&self) -> Result<(), McpError> {
        self.connect().await
    }

    /// List available tools from the MCP server
    ///
    /// Returns a list of tool definitions including name, description, and input schema.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError> {
        self.ensure_connected().await?;

        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| McpError::Connection("Not connected".to_string()))?;

        let result = service
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(format!("Failed to list tools: {}", e)))?;

        Ok(result
            .tools
            .into_iter()
            .map(|tool| ToolDefinition {
                name: tool.name.to_string(),
                description: tool.description.unwrap_or_default().to_string(),
                input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    /// Call a tool on the MCP server
    ///
    /// # Arguments
    /// * `name` - The name of the tool to call
    /// * `arguments` - JSON object containing the tool arguments
    pub async fn call_tool(
        &self,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        self.ensure_connected().await?;

        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| McpError::Connection("Not connected".to_string()))?;

        let params = CallToolRequestParam {
            name: name.into(),
            arguments: arguments.as_object().cloned(),
        };

        let result = service
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolExecution(format!("Tool execution failed: {}", e)))?;

        // Convert the result to JSON
        // The result contains a Vec<Content>, we'll serialize it
        serde_json::to_value(result).map_err(McpError::Json)
    }

    /// Disconnect from the MCP server
    ///
    /// After disconnection, the client can be reconnected by calling `connect()` again.
    pub async fn disconnect(&self) -> Result<(), McpError> {
        let mut service_guard = self.service.write().await;

        if let Some(service) = service_guard.take() {
            service
                .cancel()
                .await
                .map_err(|e| McpError::Connection(format!("Failed to disconnect: {}", e)))?;
        }

        Ok(())
    }
}

/// Tool definition from an MCP server
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the tool's input
    pub input_schema: serde_json::Value,
}
