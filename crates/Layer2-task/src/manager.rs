//! Run session registry - tracks open sessions and their lifecycle
//!
//! Sessions are kept in the order they were opened (for close-to-the-left /
//! close-to-the-right / close-others semantics) and are also addressable by
//! their literal command string (close-all-with-this-command). Closing a
//! batch that still contains running processes asks the UI for exactly one
//! confirmation covering the whole batch; declining leaves every session
//! untouched.

use crate::ansi::AnsiRenderer;
use crate::expand::{expand_command, tokenize};
use crate::log::OutputSink;
use crate::registry::TaskRegistry;
use crate::session::{RunSession, SessionId, SessionStatus};
use crate::supervisor::ProcessSupervisor;
use runcode_foundation::{Error, EventBus, EventCategory, Result, RunEvent, UiDelegate};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// Confirmation wording when a single running session is being closed
const CLOSE_RUNNING_PROMPT: &str = "Closing a running process stops it. Proceed?";

/// Run Session Registry - owns every open session and its teardown
pub struct SessionManager {
    /// All sessions by ID
    sessions: Arc<RwLock<HashMap<SessionId, RunSession>>>,

    /// Session IDs in the order they were opened
    order: Arc<RwLock<Vec<SessionId>>>,

    /// Process supervisor
    supervisor: ProcessSupervisor,

    /// Lifecycle event bus (core -> UI)
    events: Arc<EventBus>,

    /// UI collaborator for prompts and confirmations
    delegate: Arc<dyn UiDelegate>,
}

impl SessionManager {
    /// Create a new session manager bound to the given UI delegate
    pub fn new(delegate: Arc<dyn UiDelegate>) -> Self {
        let events = Arc::new(EventBus::new());
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            order: Arc::new(RwLock::new(Vec::new())),
            supervisor: ProcessSupervisor::new(Arc::clone(&events)),
            events,
            delegate,
        }
    }

    /// The event bus carrying `session.*` lifecycle events
    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe_events(&self) -> broadcast::Receiver<RunEvent> {
        self.events.receiver()
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Open a new run session for an already-expanded command and spawn the
    /// process with the project directory as cwd. The session is registered
    /// even when the spawn fails; the failure text lands in its sink and the
    /// state is `FailedToStart`.
    pub async fn start_session(&self, command: &str, cwd: &Path) -> SessionId {
        let id = SessionId::new();
        let sink = Arc::new(OutputSink::new(id));

        // Echo the expanded command ahead of any process output, the way
        // the original console does.
        let mut renderer = AnsiRenderer::new();
        let mut echo = renderer.feed(command);
        echo.push_str(&renderer.finish());
        echo.push_str("\n\n");
        sink.append(echo).await;

        let session = RunSession::new(id, command, Arc::clone(&sink));
        let state = session.state_handle();
        {
            self.sessions.write().await.insert(id, session);
            self.order.write().await.push(id);
        }

        info!(session = %id, command, "Opened run session");
        self.events
            .publish(
                RunEvent::new("session.opened", EventCategory::Session)
                    .with_source("manager")
                    .with_payload(json!({"session": id, "command": command})),
            )
            .await;

        let tokens = tokenize(command);
        self.supervisor.start(id, &tokens, cwd, sink, state).await;
        id
    }

    /// Resolve, expand and run the task for the given file: the end-to-end
    /// "Run" flow. Ambiguous matches are settled by the delegate; zero
    /// matches surface as `NoTaskForFile`.
    pub async fn run_file(
        &self,
        registry: &TaskRegistry,
        file_path: &Path,
        project_dir: &Path,
    ) -> Result<SessionId> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let candidates = registry.resolve(&file_name);
        let task = match candidates.len() {
            0 => {
                self.delegate.show_error(
                    "Please add a configuration with which to run the current file's extension.",
                );
                return Err(Error::NoTaskForFile(file_name));
            }
            1 => candidates[0],
            _ => {
                let names: Vec<String> = candidates.iter().map(|t| t.name.clone()).collect();
                match self.delegate.choose_task(&file_name, &names).await {
                    Some(index) if index < candidates.len() => candidates[index],
                    _ => return Err(Error::Cancelled),
                }
            }
        };

        let command = expand_command(&task.command, file_path, self.delegate.as_ref()).await?;
        Ok(self.start_session(&command, project_dir).await)
    }

    /// Forcibly terminate a session's process (no grace period). A no-op
    /// when the session is unknown or already terminal.
    pub async fn cancel_session(&self, id: SessionId) -> bool {
        self.supervisor.cancel(id).await
    }

    /// Close one session. A running session asks the delegate first; a
    /// non-running session is closed without confirmation. Returns whether
    /// the session was closed.
    pub async fn close_session(&self, id: SessionId) -> bool {
        let session = self.sessions.read().await.get(&id).cloned();
        let Some(session) = session else {
            return false;
        };

        if session.is_running().await && !self.delegate.confirm(CLOSE_RUNNING_PROMPT).await {
            return false;
        }

        self.remove_session(id).await;
        true
    }

    // ========================================================================
    // Batch close
    // ========================================================================

    /// Close every session. One confirmation covers the batch when any
    /// member is still running.
    pub async fn close_all(&self) -> usize {
        let targets = self.order.read().await.clone();
        self.close_batch(targets, "all sessions").await
    }

    /// Close every session except the given one
    pub async fn close_others(&self, id: SessionId) -> usize {
        let targets: Vec<SessionId> = {
            let order = self.order.read().await;
            order.iter().copied().filter(|s| *s != id).collect()
        };
        self.close_batch(targets, "the other sessions").await
    }

    /// Close the sessions opened before the given one
    pub async fn close_to_left(&self, id: SessionId) -> usize {
        let targets: Vec<SessionId> = {
            let order = self.order.read().await;
            match order.iter().position(|s| *s == id) {
                Some(pos) => order[..pos].to_vec(),
                None => return 0,
            }
        };
        self.close_batch(targets, "the sessions to the left").await
    }

    /// Close the sessions opened after the given one
    pub async fn close_to_right(&self, id: SessionId) -> usize {
        let targets: Vec<SessionId> = {
            let order = self.order.read().await;
            match order.iter().position(|s| *s == id) {
                Some(pos) => order[pos + 1..].to_vec(),
                None => return 0,
            }
        };
        self.close_batch(targets, "the sessions to the right").await
    }

    /// Close every session whose literal command equals the given one
    pub async fn close_matching(&self, command: &str) -> usize {
        let targets: Vec<SessionId> = {
            let order = self.order.read().await;
            let sessions = self.sessions.read().await;
            order
                .iter()
                .copied()
                .filter(|id| sessions.get(id).is_some_and(|s| s.command == command))
                .collect()
        };
        let description = format!("every session running `{}`", command);
        self.close_batch(targets, &description).await
    }

    /// All-or-nothing batch teardown: when any target is still running, a
    /// single confirmation decides the fate of the whole batch.
    async fn close_batch(&self, targets: Vec<SessionId>, description: &str) -> usize {
        if targets.is_empty() {
            return 0;
        }

        let mut running = 0usize;
        for id in &targets {
            if self.is_running(*id).await {
                running += 1;
            }
        }
        if running > 0 {
            let message = format!(
                "Closing {} stops {} running process(es). Proceed?",
                description, running
            );
            if !self.delegate.confirm(&message).await {
                return 0;
            }
        }

        for id in &targets {
            self.remove_session(*id).await;
        }
        targets.len()
    }

    /// Cancel if still running, detach the sink, drop the session
    async fn remove_session(&self, id: SessionId) {
        self.supervisor.cancel(id).await;

        let session = self.sessions.write().await.remove(&id);
        self.order.write().await.retain(|s| *s != id);

        if let Some(session) = session {
            session.sink.mark_ended().await;
        }

        debug!(session = %id, "Closed run session");
        self.events
            .publish(
                RunEvent::new("session.closed", EventCategory::Session)
                    .with_source("manager")
                    .with_payload(json!({"session": id})),
            )
            .await;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether a session's process is currently running
    pub async fn is_running(&self, id: SessionId) -> bool {
        match self.sessions.read().await.get(&id) {
            Some(session) => session.is_running().await,
            None => false,
        }
    }

    /// Snapshot one session
    pub async fn status(&self, id: SessionId) -> Option<SessionStatus> {
        let session = self.sessions.read().await.get(&id).cloned();
        match session {
            Some(session) => Some(session.status().await),
            None => None,
        }
    }

    /// Snapshot every session in open order
    pub async fn statuses(&self) -> Vec<SessionStatus> {
        let order = self.order.read().await.clone();
        let mut out = Vec::with_capacity(order.len());
        for id in order {
            if let Some(status) = self.status(id).await {
                out.push(status);
            }
        }
        out
    }

    /// Session IDs in open order
    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.order.read().await.clone()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Subscribe to a session's rendered output chunks
    pub async fn subscribe_output(&self, id: SessionId) -> Option<broadcast::Receiver<String>> {
        self.sessions.read().await.get(&id).map(|s| s.sink.subscribe())
    }

    /// Full scrollback of a session's sink
    pub async fn output_snapshot(&self, id: SessionId) -> Option<String> {
        let session = self.sessions.read().await.get(&id).cloned();
        match session {
            Some(session) => Some(session.sink.snapshot().await),
            None => None,
        }
    }
}
