//! Logical tool → executable resolution.

use crate::config::Settings;
use crate::error::{IdeError, Result};
use crate::venv::{ENV_BIN_DIR, EnvironmentSelection};

use super::Invocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// System interpreter, used by run and debug.
    Interpreter,
    /// Package installer bundled with the selected environment.
    Installer,
    /// Interactive system shell.
    Shell,
}

impl Tool {
    /// Whether resolving this tool needs a selected environment.
    pub fn is_environment_scoped(self) -> bool {
        matches!(self, Tool::Installer)
    }
}

#[derive(Debug, Clone)]
pub struct CommandResolver {
    interpreter: String,
    installer: String,
    shell: String,
}

impl CommandResolver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            interpreter: settings.interpreter.clone(),
            installer: settings.installer.clone(),
            shell: settings.shell_command(),
        }
    }

    /// Build the invocation for `tool` with `args`.
    ///
    /// Construction is textual only: a program path that does not exist
    /// still resolves, and the failure shows up when the process is spawned.
    pub fn resolve<S: AsRef<str>>(
        &self,
        tool: Tool,
        args: &[S],
        environment: &EnvironmentSelection,
    ) -> Result<Invocation> {
        let args = args.iter().map(|a| a.as_ref().to_string());
        let invocation = match tool {
            Tool::Interpreter => Invocation::new(&self.interpreter, args),
            Tool::Shell => Invocation::new(&self.shell, args),
            Tool::Installer => {
                let root = environment.root().ok_or(IdeError::NoEnvironmentSelected)?;
                Invocation::new(root.join(ENV_BIN_DIR).join(&self.installer), args)
            }
        };
        tracing::debug!(?tool, %invocation, "Resolved command");
        Ok(invocation)
    }
}
