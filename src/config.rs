//! User settings for the tools the editor launches.
//!
//! Settings live in `~/.rusty-ide/settings.json`. Every field is optional in
//! the file; anything left out falls back to the platform default.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IdeError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interpreter used for run, debug and environment creation.
    pub interpreter: String,
    /// Module passed to `-m` when debugging.
    pub debugger_module: String,
    /// Installer executable name inside an environment's binary directory.
    pub installer: String,
    /// Shell override. When unset, `$SHELL` (or `%COMSPEC%` on Windows) is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interpreter: if cfg!(windows) { "python" } else { "python3" }.to_string(),
            debugger_module: "pdb".to_string(),
            installer: "pip".to_string(),
            shell: None,
        }
    }
}

impl Settings {
    /// The shell launched by the open-shell action.
    pub fn shell_command(&self) -> String {
        if let Some(shell) = self.shell.as_ref().filter(|s| !s.trim().is_empty()) {
            return shell.clone();
        }
        if cfg!(windows) {
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
        } else {
            std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
        }
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(IdeError::Config {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        serde_json::from_str(&raw).map_err(|e| IdeError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty-ide")
        .join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "installer": "uv-pip", "shell": "/bin/bash" }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.installer, "uv-pip");
        assert_eq!(settings.debugger_module, "pdb");
        assert_eq!(settings.shell_command(), "/bin/bash");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load(&path), Err(IdeError::Config { .. })));
    }

    #[test]
    fn test_blank_shell_override_is_ignored() {
        let settings = Settings {
            shell: Some("  ".to_string()),
            ..Settings::default()
        };
        assert!(!settings.shell_command().trim().is_empty());
    }
}
