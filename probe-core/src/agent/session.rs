//! Session persistence bridge: load history from a [`SessionStore`] before
//! the first turn, save it back after every completed turn. A session's
//! `messages` are already exactly the agent's `History` shape, so no
//! conversion is needed in either direction.

use crate::events::AgentEvent;
use crate::session::{Session, SessionError};
use crate::types::Message;

use super::types::SessionInfo;
use super::Agent;

impl Agent {
    /// Load history from the configured session store, if any and if this
    /// agent's in-memory history is still empty. Idempotent.
    pub(super) async fn load_session_history(&self) -> Result<(), SessionError> {
        let Some(store) = &self.session_store else {
            return Ok(());
        };

        let mut history = self.history.write().await;
        if !history.is_empty() {
            return Ok(());
        }

        let session = store.get_or_create_session().await?;
        if !session.messages.is_empty() {
            self.emit_event(AgentEvent::SessionResumed {
                session_id: session.id.clone(),
                message_count: session.messages.len(),
                created_at: session.created_at,
            });
            *history = session.messages;
        }
        Ok(())
    }

    /// Persist the current history back to the session store, if configured.
    pub(super) async fn save_session_history(&self) -> Result<(), SessionError> {
        let Some(store) = &self.session_store else {
            return Ok(());
        };

        let mut session = store.get_or_create_session().await?;
        session.messages = self.history.read().await.clone();
        session.updated_at = chrono::Utc::now();
        store.save_session(&session).await?;
        self.emit_event(AgentEvent::SessionSaved {
            session_id: session.id,
            message_count: session.messages.len(),
        });
        Ok(())
    }

    /// Get current session information.
    pub async fn get_session_info(&self) -> Result<Option<SessionInfo>, SessionError> {
        let Some(store) = &self.session_store else {
            return Ok(None);
        };
        let session = store.get_or_create_session().await?;
        Ok(Some(SessionInfo {
            id: session.id,
            directory: session.directory,
            message_count: session.messages.len(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }))
    }

    /// Last `limit` messages from the stored session history.
    pub async fn get_session_history(&self, limit: usize) -> Result<Vec<Message>, SessionError> {
        let Some(store) = &self.session_store else {
            return Ok(Vec::new());
        };
        let session = store.get_or_create_session().await?;
        let start = session.messages.len().saturating_sub(limit);
        Ok(session.messages[start..].to_vec())
    }

    /// Delete the current session's stored history. Idempotent when no
    /// store is configured.
    pub async fn clear_session(&self) -> Result<(), SessionError> {
        if let Some(store) = &self.session_store {
            let session: Session = store.get_or_create_session().await?;
            store.delete_session(&session.id).await?;
        }
        Ok(())
    }
}
