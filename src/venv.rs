//! Isolated interpreter environments.
//!
//! Creating an environment and selecting one are separate actions: `create`
//! never changes the selection. The selection is only ever set by an explicit
//! `select` and is kept for the rest of the session.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{IdeError, Result};

/// Directory holding an environment's executables.
pub const ENV_BIN_DIR: &str = if cfg!(windows) { "Scripts" } else { "bin" };

/// Marker file present at the root of every environment.
const ENV_MARKER: &str = "pyvenv.cfg";

/// The currently selected environment root, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentSelection(Option<PathBuf>);

impl EnvironmentSelection {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self(Some(root.into()))
    }

    pub fn root(&self) -> Option<&Path> {
        self.0.as_deref()
    }

    pub fn is_selected(&self) -> bool {
        self.0.is_some()
    }
}

#[derive(Debug)]
pub struct EnvironmentManager {
    interpreter: String,
    selection: EnvironmentSelection,
}

impl EnvironmentManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            interpreter: settings.interpreter.clone(),
            selection: EnvironmentSelection::default(),
        }
    }

    /// Build a new environment (with its package installer) at `dir`.
    ///
    /// The returned future owns everything it needs, so it can be spawned
    /// onto the runtime while the manager stays on the UI loop.
    pub fn create(
        &self,
        dir: impl Into<PathBuf>,
    ) -> impl Future<Output = Result<PathBuf>> + Send + 'static {
        let interpreter = self.interpreter.clone();
        let dir = dir.into();
        async move { create_environment(&interpreter, dir).await }
    }

    /// Record `dir` as the active environment.
    pub fn select(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        if dir.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(IdeError::EnvironmentNotFound);
        }
        if !dir.join(ENV_MARKER).is_file() {
            warn!("{} has no {}, selecting it anyway", dir.display(), ENV_MARKER);
        }
        info!("Selected environment {}", dir.display());
        self.selection = EnvironmentSelection::at(dir);
        Ok(())
    }

    pub fn current(&self) -> Option<&Path> {
        self.selection.root()
    }

    pub fn selection(&self) -> &EnvironmentSelection {
        &self.selection
    }

    /// Status bar text.
    pub fn label(&self) -> String {
        match self.current() {
            Some(root) => format!("Venv: {}", root.display()),
            None => "Venv: Not Loaded".to_string(),
        }
    }
}

async fn create_environment(interpreter: &str, dir: PathBuf) -> Result<PathBuf> {
    let fail = |reason: String| IdeError::EnvironmentCreation {
        path: dir.clone(),
        reason,
    };

    if dir.as_os_str().is_empty() {
        return Err(fail("no directory given".to_string()));
    }
    check_target(&dir).map_err(fail)?;

    info!("Creating environment at {} with {}", dir.display(), interpreter);
    let output = Command::new(interpreter)
        .args(["-m", "venv"])
        .arg(&dir)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| fail(format!("could not run {interpreter}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("{interpreter} exited with {}", output.status),
            msg => msg.to_string(),
        };
        return Err(fail(reason));
    }

    info!("Environment created at {}", dir.display());
    Ok(dir)
}

/// Reject targets that already hold something other than an environment.
fn check_target(dir: &Path) -> std::result::Result<(), String> {
    let meta = match fs::metadata(dir) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.to_string()),
    };
    if !meta.is_dir() {
        return Err("path exists and is not a directory".to_string());
    }
    if dir.join(ENV_MARKER).is_file() {
        return Ok(());
    }
    let mut entries = fs::read_dir(dir).map_err(|e| e.to_string())?;
    if entries.next().is_some() {
        return Err("directory is not empty and is not a virtual environment".to_string());
    }
    Ok(())
}
