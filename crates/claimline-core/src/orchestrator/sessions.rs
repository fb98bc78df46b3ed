//! In-memory session store with optional persistence via StateStore.

use crate::error::ClaimlineCoreError;
use crate::state::StateStore;
use crate::types::{DocumentAnalysis, Message, Session, SessionSummary};
use claimline_protocol::SessionId;
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Session storage facade used by the orchestrator.
#[derive(Clone)]
pub(crate) struct SessionStore {
    /// In-memory session cache.
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    /// Optional persistent store for sessions.
    state_store: Option<Arc<dyn StateStore>>,
}

impl SessionStore {
    /// Create a new session store with an optional backing store.
    pub(crate) fn new(state_store: Option<Arc<dyn StateStore>>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            state_store,
        }
    }

    /// Create a new session and persist it if configured.
    pub(crate) fn create_session(&self) -> Result<SessionId, ClaimlineCoreError> {
        let session = Session {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            created_at: chrono::Utc::now(),
        };
        info!("created session (session_id={})", session.id);

        if let Some(store) = &self.state_store {
            store
                .record_session(session.id, session.created_at)
                .map_err(|err| ClaimlineCoreError::State(err.to_string()))?;
        }

        let session_id = session.id;
        self.sessions.write().insert(session.id, session);
        Ok(session_id)
    }

    /// Resume a session from cache or persistent store.
    pub(crate) fn resume_session(
        &self,
        session_id: SessionId,
    ) -> Result<Session, ClaimlineCoreError> {
        if let Some(session) = self.sessions.read().get(&session_id).cloned() {
            return Ok(session);
        }

        if let Some(store) = &self.state_store
            && let Some(session) = store
                .load_session(session_id)
                .map_err(|err| ClaimlineCoreError::State(err.to_string()))?
        {
            debug!("loaded session from store (session_id={})", session_id);
            self.sessions.write().insert(session_id, session.clone());
            return Ok(session);
        }

        Err(ClaimlineCoreError::UnknownSession(session_id))
    }

    /// Return the message history for a session. Unknown sessions yield
    /// an empty history rather than an error so reconnecting clients can
    /// always render a transcript.
    pub(crate) fn history(&self, session_id: SessionId) -> Result<Vec<Message>, ClaimlineCoreError> {
        match self.resume_session(session_id) {
            Ok(session) => Ok(session.messages),
            Err(ClaimlineCoreError::UnknownSession(_)) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// List all session summaries, using persistence when configured.
    pub(crate) fn list_sessions(&self) -> Result<Vec<SessionSummary>, ClaimlineCoreError> {
        if let Some(store) = &self.state_store {
            return store
                .list_sessions()
                .map_err(|err| ClaimlineCoreError::State(err.to_string()));
        }

        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .values()
            .map(|session| SessionSummary {
                id: session.id,
                message_count: session.messages.len(),
                created_at: session.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Append a message to a session and persist it if configured. The
    /// in-memory cache is always updated; a persistence failure is the
    /// returned error.
    pub(crate) fn append_message(
        &self,
        session_id: SessionId,
        message: &Message,
    ) -> Result<(), ClaimlineCoreError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(ClaimlineCoreError::UnknownSession(session_id))?;
        debug!(
            "appending message (session_id={}, role={}, text_len={})",
            session_id,
            message.role.as_str(),
            message.text.len()
        );
        session.messages.push(message.clone());
        drop(sessions);

        if let Some(store) = &self.state_store {
            store
                .append_message(session_id, message)
                .map_err(|err| ClaimlineCoreError::State(err.to_string()))?;
        }
        Ok(())
    }

    /// Record a document analysis, persisting it if configured.
    pub(crate) fn record_document_analysis(
        &self,
        analysis: &DocumentAnalysis,
    ) -> Result<(), ClaimlineCoreError> {
        if let Some(store) = &self.state_store {
            store
                .record_document_analysis(analysis)
                .map_err(|err| ClaimlineCoreError::State(err.to_string()))?;
        }
        Ok(())
    }

    /// Load document analyses for a session, oldest first.
    pub(crate) fn document_analyses(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<DocumentAnalysis>, ClaimlineCoreError> {
        match &self.state_store {
            Some(store) => store
                .load_document_analyses(session_id)
                .map_err(|err| ClaimlineCoreError::State(err.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;
    use crate::state::SqliteStateStore;
    use crate::types::Message;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn in_memory_store_lists_sessions() {
        let store = SessionStore::new(None);
        let session_id = store.create_session().expect("create");
        let summaries = store.list_sessions().expect("list");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, session_id);
    }

    #[test]
    fn unknown_session_history_is_empty() {
        let store = SessionStore::new(None);
        let history = store.history(Uuid::new_v4()).expect("history");
        assert_eq!(history, Vec::new());
    }

    #[test]
    fn persisted_sessions_resume_across_instances() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("claimline.db");
        let state = SqliteStateStore::open(&path).expect("state");
        let store = SessionStore::new(Some(Arc::new(state)));

        let session_id = store.create_session().expect("create");
        let message = Message::user("hello");
        store.append_message(session_id, &message).expect("append");

        let store = SessionStore::new(Some(Arc::new(
            SqliteStateStore::open(&path).expect("state"),
        )));
        let session = store.resume_session(session_id).expect("resume");
        assert_eq!(session.messages, vec![message]);

        let summaries = store.list_sessions().expect("list");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 1);
    }
}
