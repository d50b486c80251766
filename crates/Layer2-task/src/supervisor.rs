//! Process supervisor - spawns task commands and streams their output
//!
//! One process per session. On start, two reader tasks (stdout, stderr)
//! forward complete lines into a single mpsc funnel; one writer task owns
//! the session's ANSI renderer and sink, so appends are whole-line and
//! never interleave mid-chunk. No ordering is promised between the two
//! streams, only within each.
//!
//! Cancellation is a hard kill: the closed pipes unblock both readers,
//! remaining buffered output is flushed, and the writer records the
//! `Killed` state after reaping the child.

use crate::ansi::AnsiRenderer;
use crate::log::OutputSink;
use crate::session::SessionId;
use crate::state::RunState;
use runcode_foundation::{EventBus, EventCategory, RunEvent};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Funnel capacity between the reader tasks and the writer task
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Per-session process bookkeeping
struct ProcessInfo {
    /// Child handle; taken out by whichever side reaps first
    child: Option<Child>,

    /// Set by `cancel` so the writer records `Killed` instead of `Completed`
    kill_requested: bool,
}

/// Spawns and supervises one external process per run session
pub struct ProcessSupervisor {
    /// Live processes by session ID
    processes: Arc<RwLock<HashMap<SessionId, Arc<Mutex<ProcessInfo>>>>>,

    /// Lifecycle event sink
    events: Arc<EventBus>,
}

impl ProcessSupervisor {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            processes: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Check whether the session's process is still held (i.e. not reaped)
    pub async fn is_running(&self, id: SessionId) -> bool {
        self.processes.read().await.contains_key(&id)
    }

    /// Spawn the command with the project directory as cwd and attach the
    /// stream readers. Returns `Running` on success; on spawn failure the
    /// error text is rendered into the sink and the result is the terminal
    /// `FailedToStart`.
    pub async fn start(
        &self,
        id: SessionId,
        tokens: &[String],
        cwd: &Path,
        sink: Arc<OutputSink>,
        state: Arc<RwLock<RunState>>,
    ) -> RunState {
        if tokens.is_empty() {
            return self
                .fail_to_start(id, "empty command", &sink, &state)
                .await;
        }

        debug!(session = %id, command = %tokens.join(" "), "Spawning process");

        let mut cmd = Command::new(&tokens[0]);
        cmd.args(&tokens[1..])
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return self
                    .fail_to_start(id, &e.to_string(), &sink, &state)
                    .await;
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        {
            let mut processes = self.processes.write().await;
            processes.insert(
                id,
                Arc::new(Mutex::new(ProcessInfo {
                    child: Some(child),
                    kill_requested: false,
                })),
            );
        }

        *state.write().await = RunState::Running;
        self.publish_state(id, RunState::Running).await;

        // Reader tasks funnel complete lines into one writer; when both hit
        // end-of-stream the funnel closes and the writer reaps the child.
        let (tx, rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);
        if let Some(stdout) = stdout {
            spawn_line_reader(stdout, tx.clone());
        }
        if let Some(stderr) = stderr {
            spawn_line_reader(stderr, tx.clone());
        }
        drop(tx);

        self.spawn_writer(id, rx, sink, state);

        RunState::Running
    }

    /// Forcibly terminate the session's process. Returns true if a kill was
    /// delivered; a no-op (false) when the session is unknown or already
    /// reaped.
    pub async fn cancel(&self, id: SessionId) -> bool {
        let info = self.processes.read().await.get(&id).cloned();
        let Some(info) = info else {
            return false;
        };

        let mut guard = info.lock().await;
        guard.kill_requested = true;
        if let Some(child) = guard.child.as_mut() {
            match child.kill().await {
                Ok(()) => {
                    info!(session = %id, "Killed process");
                    true
                }
                Err(e) => {
                    warn!(session = %id, error = %e, "Failed to kill process");
                    false
                }
            }
        } else {
            false
        }
    }

    /// Single writer task: renders every funneled line, flushes the
    /// renderer at end-of-stream, reaps the child and records the terminal
    /// state.
    fn spawn_writer(
        &self,
        id: SessionId,
        mut rx: mpsc::Receiver<String>,
        sink: Arc<OutputSink>,
        state: Arc<RwLock<RunState>>,
    ) {
        let processes = Arc::clone(&self.processes);
        let events = Arc::clone(&self.events);

        tokio::spawn(async move {
            let mut renderer = AnsiRenderer::new();
            while let Some(line) = rx.recv().await {
                sink.append(renderer.feed(&line)).await;
            }
            sink.append(renderer.finish()).await;

            // Both readers saw end-of-stream; reap the child.
            let info = processes.read().await.get(&id).cloned();
            let mut killed = false;
            let mut exit_code = -1;
            if let Some(info) = info {
                let (child, kill_requested) = {
                    let mut guard = info.lock().await;
                    (guard.child.take(), guard.kill_requested)
                };
                killed = kill_requested;
                if let Some(mut child) = child {
                    match child.wait().await {
                        Ok(status) => exit_code = status.code().unwrap_or(-1),
                        Err(e) => warn!(session = %id, error = %e, "Failed to reap process"),
                    }
                }
            }
            processes.write().await.remove(&id);

            let final_state = if killed {
                RunState::Killed
            } else {
                if exit_code != 0 {
                    sink.append(format!("\nProcess exited with code {}\n", exit_code))
                        .await;
                }
                RunState::Completed(exit_code)
            };

            *state.write().await = final_state;
            sink.mark_ended().await;
            debug!(session = %id, state = %final_state, "Session finished");

            events
                .publish(
                    RunEvent::new("session.state_changed", EventCategory::Session)
                        .with_source("supervisor")
                        .with_payload(json!({"session": id, "state": final_state})),
                )
                .await;
        });
    }

    async fn fail_to_start(
        &self,
        id: SessionId,
        message: &str,
        sink: &Arc<OutputSink>,
        state: &Arc<RwLock<RunState>>,
    ) -> RunState {
        warn!(session = %id, error = message, "Failed to spawn process");

        // The failure text goes into the session's own console, escaped
        // through the same rendering path as process output.
        let mut renderer = AnsiRenderer::new();
        let mut text = renderer.feed(message);
        text.push_str(&renderer.finish());
        text.push('\n');
        sink.append(text).await;
        sink.mark_ended().await;

        *state.write().await = RunState::FailedToStart;

        self.events
            .publish(
                RunEvent::new("session.spawn_failed", EventCategory::Session)
                    .with_source("supervisor")
                    .with_payload(json!({"session": id, "message": message})),
            )
            .await;
        self.publish_state(id, RunState::FailedToStart).await;

        RunState::FailedToStart
    }

    async fn publish_state(&self, id: SessionId, state: RunState) {
        self.events
            .publish(
                RunEvent::new("session.state_changed", EventCategory::Session)
                    .with_source("supervisor")
                    .with_payload(json!({"session": id, "state": state})),
            )
            .await;
    }
}

/// Reader loop for one output stream: forwards each complete line (plus its
/// terminator) into the funnel until end-of-stream.
fn spawn_line_reader<R>(stream: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if tx.send(format!("{}\n", line)).await.is_err() {
                break;
            }
        }
    });
}
