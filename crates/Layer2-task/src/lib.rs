//! # runcode-task
//!
//! The run-task subsystem of the RunCode editor: given the file being
//! edited, resolve a user-declared task for its extension, expand the
//! task's command template, spawn the process in the project directory and
//! stream its colorized output into a live per-session sink.
//!
//! ## Pipeline
//!
//! ```text
//! TaskRegistry::resolve(file)
//!     -> expand::expand_command(template, file, delegate)
//!     -> SessionManager::start_session(command, project_dir)
//!     -> ProcessSupervisor (stdout/stderr readers -> AnsiRenderer -> sink)
//! ```
//!
//! The UI layer is an external collaborator: it implements `UiDelegate`
//! (prompts, confirmations, task choice), consumes the sink's rendered
//! chunks and the `session.*` events, and decides when sessions close.

pub mod ansi;
pub mod expand;
pub mod log;
pub mod manager;
pub mod registry;
pub mod session;
pub mod state;
pub mod supervisor;

// Task configuration
pub use registry::{global_config_path, TaskDefinition, TaskRegistry, PROJECT_CONFIG_FILE};

// Command expansion
pub use expand::{expand_builtins, expand_command, tokenize};

// Rendering
pub use ansi::AnsiRenderer;

// Sessions
pub use log::OutputSink;
pub use manager::SessionManager;
pub use session::{RunSession, SessionId, SessionStatus};
pub use state::RunState;
pub use supervisor::ProcessSupervisor;

// Re-exported foundation surface
pub use runcode_foundation::{Error, EventBus, EventCategory, Result, RunEvent, UiDelegate};
