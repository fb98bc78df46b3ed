//! Session persistence for Claimline backed by SQLite.

use crate::types::{DocumentAnalysis, Message, Role, Session, SessionSummary};
use chrono::{DateTime, Utc};
use claimline_protocol::{LegalCategory, SessionId, Track};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the state store.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
}

/// Persistent store abstraction for sessions, messages and document
/// analyses.
pub trait StateStore: Send + Sync {
    /// Record a new session creation.
    fn record_session(
        &self,
        session_id: SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StateError>;
    /// Append a message to a session.
    fn append_message(&self, session_id: SessionId, message: &Message) -> Result<(), StateError>;
    /// Record a completed document analysis.
    fn record_document_analysis(&self, analysis: &DocumentAnalysis) -> Result<(), StateError>;
    /// Load a full session transcript by id.
    fn load_session(&self, session_id: SessionId) -> Result<Option<Session>, StateError>;
    /// List all session summaries, most recently created first.
    fn list_sessions(&self) -> Result<Vec<SessionSummary>, StateError>;
    /// Load all document analyses for a session, oldest first.
    fn load_document_analyses(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<DocumentAnalysis>, StateError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS messages (
    seq INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    role TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    legal_category TEXT,
    track TEXT,
    citations TEXT NOT NULL,
    document_analysis_id TEXT
);
CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, seq);
CREATE TABLE IF NOT EXISTS document_analyses (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    filename TEXT NOT NULL,
    extracted_text TEXT NOT NULL,
    ai_summary TEXT NOT NULL,
    defence_points TEXT NOT NULL,
    track_assessment TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_analyses_session ON document_analyses(session_id, created_at);
";

/// SQLite-backed state store implementation.
pub struct SqliteStateStore {
    conn: Mutex<Connection>,
}

impl SqliteStateStore {
    /// Open or create a store at the given path, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        info!("opened sqlite state store (path={})", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory store; used in tests and when persistence
    /// should not touch disk.
    pub fn open_in_memory() -> Result<Self, StateError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl StateStore for SqliteStateStore {
    fn record_session(
        &self,
        session_id: SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        info!("recording session creation (session_id={session_id})");
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO sessions (id, created_at) VALUES (?1, ?2)",
            params![session_id.to_string(), created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn append_message(&self, session_id: SessionId, message: &Message) -> Result<(), StateError> {
        debug!(
            "appending message (session_id={}, role={}, text_len={})",
            session_id,
            message.role.as_str(),
            message.text.len()
        );
        let citations = serde_json::to_string(&message.citations)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (id, session_id, role, text, created_at, legal_category, \
             track, citations, document_analysis_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                message.id.to_string(),
                session_id.to_string(),
                message.role.as_str(),
                message.text,
                message.created_at.to_rfc3339(),
                message.legal_category.map(|c| c.as_str()),
                message.track.map(|t| t.as_str()),
                citations,
                message.document_analysis_id.map(|id| id.to_string()),
            ],
        )?;
        Ok(())
    }

    fn record_document_analysis(&self, analysis: &DocumentAnalysis) -> Result<(), StateError> {
        debug!(
            "recording document analysis (session_id={}, filename={})",
            analysis.session_id, analysis.filename
        );
        let defence_points = serde_json::to_string(&analysis.defence_points)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO document_analyses (id, session_id, filename, extracted_text, \
             ai_summary, defence_points, track_assessment, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                analysis.id.to_string(),
                analysis.session_id.to_string(),
                analysis.filename,
                analysis.extracted_text,
                analysis.ai_summary,
                defence_points,
                analysis.track_assessment.as_str(),
                analysis.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load_session(&self, session_id: SessionId) -> Result<Option<Session>, StateError> {
        let conn = self.conn.lock();
        let created_at: Option<String> = conn
            .query_row(
                "SELECT created_at FROM sessions WHERE id = ?1",
                params![session_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(created_at) = created_at else {
            return Ok(None);
        };

        let mut statement = conn.prepare(
            "SELECT id, role, text, created_at, legal_category, track, citations, \
             document_analysis_id \
             FROM messages WHERE session_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = statement.query_map(params![session_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, role, text, ts, category, track, citations, analysis_id) = row?;
            messages.push(Message {
                id: parse_uuid(&id)?,
                role: Role::parse(&role),
                text,
                created_at: parse_timestamp(&ts)?,
                legal_category: category.as_deref().map(LegalCategory::parse),
                track: track.as_deref().map(Track::parse),
                citations: serde_json::from_str(&citations)?,
                document_analysis_id: analysis_id.as_deref().map(parse_uuid).transpose()?,
            });
        }

        Ok(Some(Session {
            id: session_id,
            messages,
            created_at: parse_timestamp(&created_at)?,
        }))
    }

    fn list_sessions(&self) -> Result<Vec<SessionSummary>, StateError> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare(
            "SELECT s.id, s.created_at, COUNT(m.id) \
             FROM sessions s LEFT JOIN messages m ON m.session_id = s.id \
             GROUP BY s.id ORDER BY s.created_at DESC",
        )?;
        let rows = statement.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, created_at, count) = row?;
            summaries.push(SessionSummary {
                id: parse_uuid(&id)?,
                message_count: count as usize,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(summaries)
    }

    fn load_document_analyses(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<DocumentAnalysis>, StateError> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare(
            "SELECT id, filename, extracted_text, ai_summary, defence_points, \
             track_assessment, created_at \
             FROM document_analyses WHERE session_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = statement.query_map(params![session_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut analyses = Vec::new();
        for row in rows {
            let (id, filename, extracted_text, ai_summary, defence_points, track, ts) = row?;
            analyses.push(DocumentAnalysis {
                id: parse_uuid(&id)?,
                session_id,
                filename,
                extracted_text,
                ai_summary,
                defence_points: serde_json::from_str(&defence_points)?,
                track_assessment: Track::parse(&track),
                created_at: parse_timestamp(&ts)?,
            });
        }
        Ok(analyses)
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, StateError> {
    Uuid::parse_str(raw).map_err(|e| StateError::InvalidValue(format!("uuid {raw}: {e}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StateError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StateError::InvalidValue(format!("timestamp {raw}: {e}")))
}
