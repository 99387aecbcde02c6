use async_trait::async_trait;
use chrono::{DateTime, Utc};
use probe_core::session::{Session, SessionError, SessionStore, SessionSummary};
use probe_core::Message;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// SQLite-based session storage
///
/// Sessions are stored in a local SQLite database, scoped to the
/// current working directory. The full message history is kept as a
/// single JSON blob per session rather than one row per message, since
/// `Message` already carries everything the agent loop needs to resume
/// a conversation byte-for-byte.
///
/// # Example
/// ```no_run
/// use probe_cli::SqliteStore;
/// use probe_core::Agent;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new(".probe/sessions.db")?;
/// // Use with agent
/// # Ok(())
/// # }
/// ```
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create new SQLite store at path
    ///
    /// Creates database file and tables if they don't exist.
    /// Path can be relative or absolute.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| SessionError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(include_str!("schema.sql"))
            .map_err(|e| SessionError::Storage(format!("Failed to initialize schema: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Use default location (.probe/sessions.db in current directory)
    pub fn default_location() -> Result<Self, SessionError> {
        Self::new(".probe/sessions.db")
    }

    fn row_to_session(
        id: String,
        directory: String,
        created_at: i64,
        updated_at: i64,
        messages_json: String,
    ) -> Result<Session, SessionError> {
        let messages: Vec<Message> =
            serde_json::from_str(&messages_json).map_err(SessionError::Serialization)?;
        Ok(Session {
            id,
            created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp(updated_at, 0).unwrap_or_else(Utc::now),
            directory,
            messages,
        })
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_or_create_session(&self) -> Result<Session, SessionError> {
        let current_dir = std::env::current_dir()
            .map_err(|e| SessionError::Storage(format!("Failed to get current directory: {}", e)))?
            .display()
            .to_string();

        let existing_id: Option<String> = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                "SELECT id FROM sessions WHERE directory = ? ORDER BY updated_at DESC LIMIT 1",
                params![current_dir],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| SessionError::Storage(e.to_string()))?
        };

        if let Some(id) = existing_id {
            self.get_session(&id)
                .await?
                .ok_or_else(|| SessionError::NotFound(id.clone()))
        } else {
            let now = Utc::now();
            let id = uuid::Uuid::new_v4().to_string();

            {
                let conn = self.conn.lock().unwrap();
                conn.execute(
                    "INSERT INTO sessions (id, directory, created_at, updated_at, messages) \
                     VALUES (?, ?, ?, ?, '[]')",
                    params![id, current_dir, now.timestamp(), now.timestamp()],
                )
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            }

            Ok(Session {
                id,
                created_at: now,
                updated_at: now,
                directory: current_dir,
                messages: Vec::new(),
            })
        }
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                "SELECT id, directory, created_at, updated_at, messages FROM sessions WHERE id = ?",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let Some((id, directory, created_at, updated_at, messages_json)) = row else {
            return Ok(None);
        };

        Self::row_to_session(id, directory, created_at, updated_at, messages_json).map(Some)
    }

    async fn save_session(&self, session: &Session) -> Result<(), SessionError> {
        let conn = self.conn.lock().unwrap();

        let messages_json =
            serde_json::to_string(&session.messages).map_err(SessionError::Serialization)?;
        let now = Utc::now();

        let rows = conn
            .execute(
                "UPDATE sessions SET updated_at = ?, messages = ? WHERE id = ?",
                params![now.timestamp(), messages_json, session.id],
            )
            .map_err(|e| SessionError::Storage(format!("Failed to update session: {}", e)))?;

        if rows == 0 {
            return Err(SessionError::NotFound(session.id.clone()));
        }

        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, directory, created_at, updated_at, messages FROM sessions \
                 ORDER BY updated_at DESC",
            )
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| SessionError::Storage(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for (id, directory, created_at, updated_at, messages_json) in rows {
            let message_count: usize = serde_json::from_str::<Vec<serde_json::Value>>(&messages_json)
                .map(|v| v.len())
                .unwrap_or(0);
            sessions.push(SessionSummary {
                id,
                directory,
                message_count,
                created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
                updated_at: DateTime::from_timestamp(updated_at, 0).unwrap_or_else(Utc::now),
            });
        }

        Ok(sessions)
    }

    async fn delete_session(&self, id: &str) -> Result<(), SessionError> {
        let conn = self.conn.lock().unwrap();

        let rows = conn
            .execute("DELETE FROM sessions WHERE id = ?", params![id])
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        if rows == 0 {
            Err(SessionError::NotFound(id.to_string()))
        } else {
            Ok(())
        }
    }
}
