// DawCommand trait definition

use crate::project::ProjectError;
use crate::project::state::Daw;
use crate::track::{TrackError, TrackId};
use std::fmt;

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors that can occur during command execution
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Command execution failed
    ExecutionFailed(String),
    /// Undo operation failed
    UndoFailed(String),
    /// Redo operation failed
    RedoFailed(String),
    /// Invalid state for this operation
    InvalidState(String),
}

impl CommandError {
    pub fn track_not_found(id: TrackId) -> Self {
        CommandError::InvalidState(format!("Track {} not found", id))
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            CommandError::UndoFailed(msg) => write!(f, "Undo failed: {}", msg),
            CommandError::RedoFailed(msg) => write!(f, "Redo failed: {}", msg),
            CommandError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<TrackError> for CommandError {
    fn from(error: TrackError) -> Self {
        CommandError::ExecutionFailed(error.to_string())
    }
}

impl From<ProjectError> for CommandError {
    fn from(error: ProjectError) -> Self {
        CommandError::ExecutionFailed(error.to_string())
    }
}

/// A discrete user action
///
/// `Daw::execute` snapshots the whole project under `description()` before
/// calling `apply`, so commands never store undo state themselves. The
/// snapshot is only kept when `apply` reports a change.
///
/// # Example
/// ```no_run
/// use stepdaw::command::{CommandResult, DawCommand};
/// use stepdaw::project::Daw;
///
/// struct SetTempo(f64);
///
/// impl DawCommand for SetTempo {
///     fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
///         daw.set_tempo(self.0);
///         Ok(true)
///     }
///
///     fn description(&self) -> String {
///         format!("Set tempo to {:.0}", self.0)
///     }
/// }
/// ```
pub trait DawCommand {
    /// Perform the action; Ok(false) when nothing changed
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool>;

    /// Human-readable label, shown as "Undo: ..."
    fn description(&self) -> String;
}
