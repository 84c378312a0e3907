//! The user actions that launch processes.
//!
//! Run, debug, install, list and shell all go through the same path: check
//! the action's preconditions, resolve the command, and hand it to the
//! process manager. They differ only in the command and in which
//! preconditions gate the launch.

use std::path::Path;

use tokio::sync::mpsc::Receiver;

use crate::config::Settings;
use crate::console::ConsoleSink;
use crate::editor::EditorFacade;
use crate::error::{IdeError, Result};
use crate::runtime::{CommandResolver, ProcessEvent, ProcessId, ProcessManager, Tool};
use crate::venv::EnvironmentManager;

pub struct Workbench {
    debugger_module: String,
    resolver: CommandResolver,
    environments: EnvironmentManager,
    processes: ProcessManager,
}

impl Workbench {
    /// # Returns
    /// A tuple of (Workbench, Receiver for process events)
    pub fn new(settings: &Settings) -> (Self, Receiver<ProcessEvent>) {
        let (processes, events) = ProcessManager::new(ConsoleSink::new());
        (
            Self {
                debugger_module: settings.debugger_module.clone(),
                resolver: CommandResolver::new(settings),
                environments: EnvironmentManager::new(settings),
                processes,
            },
            events,
        )
    }

    pub fn environments(&self) -> &EnvironmentManager {
        &self.environments
    }

    pub fn environments_mut(&mut self) -> &mut EnvironmentManager {
        &mut self.environments
    }

    pub fn processes(&self) -> &ProcessManager {
        &self.processes
    }

    pub fn processes_mut(&mut self) -> &mut ProcessManager {
        &mut self.processes
    }

    /// `<interpreter> -c <source>`
    pub fn run_code(&mut self, editor: &dyn EditorFacade) -> Result<ProcessId> {
        let source = editor.text();
        self.launch(Tool::Interpreter, &["-c", source.as_str()])
    }

    /// `<interpreter> <script>`, running the file as saved on disk.
    pub fn run_file(&mut self, script: &Path) -> Result<ProcessId> {
        let script = script.to_string_lossy();
        self.launch(Tool::Interpreter, &[script.as_ref()])
    }

    /// `<interpreter> -m <debugger> -c <source>`
    pub fn debug_code(&mut self, editor: &dyn EditorFacade) -> Result<ProcessId> {
        let source = editor.text();
        let debugger = self.debugger_module.clone();
        self.launch(Tool::Interpreter, &["-m", debugger.as_str(), "-c", source.as_str()])
    }

    /// `<env>/bin/<installer> install <package>`
    ///
    /// The environment is checked before the package name.
    pub fn install_package(&mut self, package: &str) -> Result<ProcessId> {
        self.require_environment()?;
        let package = package.trim();
        if package.is_empty() {
            return Err(IdeError::CommandResolution(
                "Package name must not be empty".to_string(),
            ));
        }
        self.launch(Tool::Installer, &["install", package])
    }

    /// `<env>/bin/<installer> list`
    pub fn list_packages(&mut self) -> Result<ProcessId> {
        self.launch(Tool::Installer, &["list"])
    }

    /// The system shell, with no arguments.
    pub fn open_shell(&mut self) -> Result<ProcessId> {
        self.launch::<&str>(Tool::Shell, &[])
    }

    fn require_environment(&self) -> Result<()> {
        if self.environments.selection().is_selected() {
            Ok(())
        } else {
            Err(IdeError::NoEnvironmentSelected)
        }
    }

    fn launch<S: AsRef<str>>(&mut self, tool: Tool, args: &[S]) -> Result<ProcessId> {
        if tool.is_environment_scoped() {
            self.require_environment()?;
        }
        let invocation = self
            .resolver
            .resolve(tool, args, self.environments.selection())?;
        self.processes.start(invocation)
    }
}
