//! CLI-specific error types

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Agent execution error
    #[error("Agent error: {0}")]
    Agent(#[from] probe_core::AgentError),

    /// Session storage error
    #[error("Session error: {0}")]
    Session(#[from] probe_core::SessionError),

    /// IO error (filesystem, stdout, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
