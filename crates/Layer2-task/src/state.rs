//! Run session state machine

use serde::{Deserialize, Serialize};

/// Possible states of a run session
///
/// `NotStarted -> Running -> {Completed, Killed, FailedToStart}`.
/// The three right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Session created but the process has not been spawned yet
    NotStarted,

    /// Process is alive and its output is being streamed
    Running,

    /// Process exited on its own; carries the exit code (-1 if unavailable)
    Completed(i32),

    /// Process was forcibly terminated by the user
    Killed,

    /// The OS could not create the process (missing executable, permissions)
    FailedToStart,
}

impl RunState {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed(_) | RunState::Killed | RunState::FailedToStart
        )
    }

    /// Check if the process is currently running
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    /// Check if the process exited on its own with code 0
    pub fn is_success(&self) -> bool {
        matches!(self, RunState::Completed(0))
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            RunState::NotStarted => "NotStarted",
            RunState::Running => "Running",
            RunState::Completed(_) => "Completed",
            RunState::Killed => "Killed",
            RunState::FailedToStart => "FailedToStart",
        }
    }

    /// Get a symbol for the state (for tab labels)
    pub fn symbol(&self) -> &'static str {
        match self {
            RunState::NotStarted => "◯",
            RunState::Running => "⟳",
            RunState::Completed(0) => "✓",
            RunState::Completed(_) => "✗",
            RunState::Killed => "⊘",
            RunState::FailedToStart => "✗",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
