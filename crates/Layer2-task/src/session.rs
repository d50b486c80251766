//! Run session records
//!
//! A run session is one invocation of a task's command: one process, one
//! output sink, one state handle. Sessions are tracked by the
//! `SessionManager` in the order they were opened.

use crate::log::OutputSink;
use crate::state::RunState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Unique identifier for a run session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random SessionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// One live or finished run of a task command
#[derive(Debug, Clone)]
pub struct RunSession {
    /// Session identifier
    pub id: SessionId,

    /// The fully expanded command, exactly as passed to the process
    pub command: String,

    /// When the session was opened
    pub started_at: DateTime<Utc>,

    /// Current lifecycle state, shared with the supervisor's writer task
    state: Arc<RwLock<RunState>>,

    /// The session's output sink
    pub sink: Arc<OutputSink>,
}

impl RunSession {
    pub fn new(id: SessionId, command: impl Into<String>, sink: Arc<OutputSink>) -> Self {
        Self {
            id,
            command: command.into(),
            started_at: Utc::now(),
            state: Arc::new(RwLock::new(RunState::NotStarted)),
            sink,
        }
    }

    /// Current state
    pub async fn state(&self) -> RunState {
        *self.state.read().await
    }

    /// Shared state handle for the supervisor
    pub(crate) fn state_handle(&self) -> Arc<RwLock<RunState>> {
        Arc::clone(&self.state)
    }

    pub async fn is_running(&self) -> bool {
        self.state().await.is_running()
    }

    /// Snapshot for UI queries
    pub async fn status(&self) -> SessionStatus {
        let state = self.state().await;
        SessionStatus {
            id: self.id,
            command: self.command.clone(),
            state,
            is_running: state.is_running(),
            started_at: self.started_at,
            chunk_count: self.sink.chunk_count().await,
        }
    }
}

/// Session snapshot for external queries
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub id: SessionId,
    pub command: String,
    pub state: RunState,
    pub is_running: bool,
    pub started_at: DateTime<Utc>,
    pub chunk_count: usize,
}
