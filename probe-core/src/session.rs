//! Session persistence for conversation memory
//!
//! A session is just the agent's `History` (a `Vec<Message>`) plus the
//! bookkeeping needed to find it again: an id and the working directory it
//! is scoped to. There is no separate wire format for tool calls/results —
//! they are already plain text inside assistant/user messages, so storing
//! `Message` directly (it already derives `Serialize`/`Deserialize`) is
//! enough to resume a conversation byte-for-byte.
//!
//! # Example
//! ```ignore
//! use probe_core::session::{SessionStore, Session};
//!
//! // Sessions must be provided by implementing SessionStore
//! // (e.g. a SQLite-backed store in the CLI binary).
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Message;

/// A conversation session: the history for one working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID (auto-generated)
    pub id: String,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Directory where session is active
    pub directory: String,
    /// Conversation history, in the exact shape the agent loop uses it
    pub messages: Vec<Message>,
}

/// Trait for session storage backends.
///
/// # Example
/// ```ignore
/// use probe_core::session::{SessionStore, Session, SessionSummary, SessionError};
/// use async_trait::async_trait;
///
/// struct MyStore;
///
/// #[async_trait]
/// impl SessionStore for MyStore {
///     async fn get_or_create_session(&self) -> Result<Session, SessionError> {
///         unimplemented!()
///     }
///     async fn get_session(&self, id: &str) -> Result<Option<Session>, SessionError> {
///         unimplemented!()
///     }
///     async fn save_session(&self, session: &Session) -> Result<(), SessionError> {
///         unimplemented!()
///     }
///     async fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
///         unimplemented!()
///     }
///     async fn delete_session(&self, id: &str) -> Result<(), SessionError> {
///         unimplemented!()
///     }
/// }
/// ```
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get or create the session for the current working directory.
    async fn get_or_create_session(&self) -> Result<Session, SessionError>;

    /// Get session by ID
    async fn get_session(&self, id: &str) -> Result<Option<Session>, SessionError>;

    /// Save session
    async fn save_session(&self, session: &Session) -> Result<(), SessionError>;

    /// List all sessions
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError>;

    /// Delete session
    async fn delete_session(&self, id: &str) -> Result<(), SessionError>;
}

/// Summary of a session (for listing)
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: String,
    pub directory: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur during session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
