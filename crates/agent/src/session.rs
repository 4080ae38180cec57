//! Session state holder.
//!
//! Each session owns its message history, processing flag, and selected
//! model. The store hands out one `Arc<Mutex<SessionState>>` per session id;
//! the mutex serializes all state mutation, and `is_processing` is the
//! turn-level lock. An overlapping turn for the same session is rejected,
//! not queued.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use chatarbor_core::message::{Message, SessionId};

/// Durable per-session record.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
    pub is_processing: bool,
    pub model: String,
    pub last_active: DateTime<Utc>,
}

impl SessionState {
    fn new(session_id: SessionId, model: String) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            is_processing: false,
            model,
            last_active: Utc::now(),
        }
    }

    /// Append a message, refreshing the activity timestamp.
    pub fn push(&mut self, message: Message) {
        self.last_active = Utc::now();
        self.messages.push(message);
    }
}

/// A read-only copy of a session handed to the HTTP surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub is_processing: bool,
    pub model: String,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            session_id: state.session_id.to_string(),
            messages: state.messages.clone(),
            is_processing: state.is_processing,
            model: state.model.clone(),
        }
    }
}

/// A one-line session listing entry, most recently active first.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub message_count: usize,
    pub last_active: DateTime<Utc>,
}

/// Holds every live session, keyed by id.
pub struct SessionStore {
    default_model: String,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get a session's state handle, creating an empty session on first
    /// access.
    pub async fn get_or_create(&self, id: &SessionId) -> Arc<Mutex<SessionState>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&id.0) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.0.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionState::new(
                    id.clone(),
                    self.default_model.clone(),
                )))
            })
            .clone()
    }

    /// Read-only copy of a session (creating it if new).
    pub async fn snapshot(&self, id: &SessionId) -> SessionSnapshot {
        let session = self.get_or_create(id).await;
        let state = session.lock().await;
        SessionSnapshot::from(&*state)
    }

    /// Reset a session's history wholesale. Model and flags survive.
    pub async fn clear_messages(&self, id: &SessionId) -> SessionSnapshot {
        let session = self.get_or_create(id).await;
        let mut state = session.lock().await;
        state.messages.clear();
        state.last_active = Utc::now();
        SessionSnapshot::from(&*state)
    }

    /// Swap the session's model.
    pub async fn set_model(&self, id: &SessionId, model: impl Into<String>) -> SessionSnapshot {
        let session = self.get_or_create(id).await;
        let mut state = session.lock().await;
        state.model = model.into();
        state.last_active = Utc::now();
        SessionSnapshot::from(&*state)
    }

    /// Summaries of all sessions, most recently active first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions.values() {
            let state = session.lock().await;
            summaries.push(SessionSummary {
                session_id: state.session_id.to_string(),
                message_count: state.messages.len(),
                last_active: state.last_active,
            });
        }
        summaries.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        summaries
    }
}
