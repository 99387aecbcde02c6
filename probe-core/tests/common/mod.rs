//! Common test utilities shared across test files.
//!
//! This module provides mock implementations and test helpers.
//! Items here may not be used by all test files, hence the module-level allow.
#![allow(dead_code)]

use async_trait::async_trait;
use probe_core::parser::ToolParams;
use probe_core::{ToolDescriptor, ToolError, ToolExecutor, ToolFlags, ToolOutput, ToolSourceKind};
use std::sync::Arc;

#[cfg(feature = "mcp")]
pub mod mock_mcp_server;

// ===== Test Tools =====
//
// Custom tools are registered as `ToolDescriptor`s backed by a `ToolExecutor`,
// the same shape `probe-tools` uses for the real search/query/extract tools.

/// Evaluates a hardcoded expression, for testing tool dispatch.
struct CalculateExecutor;

#[async_trait]
impl ToolExecutor for CalculateExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let expression = params.get("expression").unwrap_or_default();
        let result = if expression == "2+2" { "4" } else { "42" };
        Ok(ToolOutput::text(result))
    }
}

pub fn calculate_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: "calculate".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Evaluate a mathematical expression.\n\nUsage:\n<calculate>\n<expression>2+2</expression>\n</calculate>".to_string(),
        params_schema: None,
        executor: Arc::new(CalculateExecutor),
        flags: ToolFlags::default(),
        primary_param: Some("expression".to_string()),
    }
}

/// Returns structured JSON data, for testing `ToolResult::Json` handling.
struct GetDataExecutor;

#[async_trait]
impl ToolExecutor for GetDataExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let key = params.get("key").unwrap_or_default();
        let data = serde_json::json!({
            "key": key,
            "value": 42,
            "nested": { "field": "test" },
        });
        Ok(ToolOutput {
            result: probe_core::ToolResult::Json(data),
            discovered_images: Vec::new(),
        })
    }
}

pub fn get_data_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: "get_data".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Get structured data.\n\nUsage:\n<get_data>\n<key>some-key</key>\n</get_data>".to_string(),
        params_schema: None,
        executor: Arc::new(GetDataExecutor),
        flags: ToolFlags::default(),
        primary_param: Some("key".to_string()),
    }
}

/// Always fails, for testing tool-error propagation.
struct ErrorToolExecutor;

#[async_trait]
impl ToolExecutor for ErrorToolExecutor {
    async fn execute(&self, _params: &ToolParams) -> Result<ToolOutput, ToolError> {
        Err(ToolError::Custom("Intentional error".to_string()))
    }
}

pub fn error_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: "error_tool".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "A tool that always errors.\n\nUsage:\n<error_tool></error_tool>".to_string(),
        params_schema: None,
        executor: Arc::new(ErrorToolExecutor),
        flags: ToolFlags::default(),
        primary_param: None,
    }
}

// ===== Mock Session Store (for session feature tests) =====

#[cfg(feature = "session")]
use probe_core::{Session, SessionError, SessionStore, SessionSummary};
#[cfg(feature = "session")]
use std::sync::Mutex;

#[cfg(feature = "session")]
#[derive(Clone)]
pub struct MockSessionStore {
    sessions: Arc<Mutex<std::collections::HashMap<String, Session>>>,
    current_directory: String,
}

#[cfg(feature = "session")]
impl MockSessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(std::collections::HashMap::new())),
            current_directory: "/test/dir".to_string(),
        }
    }

    pub fn with_directory(mut self, dir: impl Into<String>) -> Self {
        self.current_directory = dir.into();
        self
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[cfg(feature = "session")]
#[async_trait::async_trait]
impl SessionStore for MockSessionStore {
    async fn get_or_create_session(&self) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.lock().unwrap();

        if let Some(session) = sessions
            .values()
            .find(|s| s.directory == self.current_directory)
        {
            return Ok(session.clone());
        }

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            directory: self.current_directory.clone(),
            messages: Vec::new(),
        };

        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn save_session(&self, session: &Session) -> Result<(), SessionError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                directory: s.directory.clone(),
                message_count: s.messages.len(),
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
            .collect())
    }

    async fn delete_session(&self, id: &str) -> Result<(), SessionError> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }
}
