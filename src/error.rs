//! Error types for the editor core.
//!
//! Every user-facing action returns one of these. The UI layer turns them
//! into blocking notices; nothing here is retried automatically.

use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::ProcessId;

#[derive(Debug, Error)]
pub enum IdeError {
    /// The environment directory could not be built.
    #[error("Failed to create virtual environment at {}: {reason}", path.display())]
    EnvironmentCreation { path: PathBuf, reason: String },

    /// An empty or cancelled path was given where an environment root was expected.
    #[error("No virtual environment directory was given")]
    EnvironmentNotFound,

    /// An environment-scoped action was requested before any environment was loaded.
    #[error("No virtual environment loaded.")]
    NoEnvironmentSelected,

    /// The operating system refused to spawn the child.
    #[error("Failed to start '{command}': {source}")]
    ProcessLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Only one child may be live at a time.
    #[error("Process {id} is still running; cancel it before starting another")]
    ProcessAlreadyRunning { id: ProcessId },

    #[error("No process is running")]
    NoActiveProcess,

    #[error("Failed to open {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed user input caught before any launch (e.g. empty package name).
    #[error("{0}")]
    CommandResolution(String),

    #[error("Invalid settings in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, IdeError>;
