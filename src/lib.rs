//! RustyIDE - a terminal code editor that runs, debugs and manages packages
//! for the code it edits.
//!
//! This library provides the core functionality for RustyIDE, including:
//! - Virtual environment creation and selection
//! - Command resolution for the interpreter, the package installer and the shell
//! - Child process management with output streamed into a console buffer
//! - The TUI application: editor pane, console pane, prompts and notices
//!
//! # Example
//!
//! ```no_run
//! use rusty_ide::config::Settings;
//! use rusty_ide::editor::{EditorFacade, TextBuffer};
//! use rusty_ide::workbench::Workbench;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (mut workbench, mut events) = Workbench::new(&Settings::default());
//!
//!     let mut buffer = TextBuffer::new();
//!     buffer.set_text("print('hello')");
//!     workbench.run_code(&buffer)?;
//!
//!     // feed output and exit notifications back into the console
//!     while let Some(event) = events.recv().await {
//!         let done = matches!(event, rusty_ide::runtime::ProcessEvent::Exited { .. });
//!         workbench.processes_mut().handle_event(event);
//!         if done {
//!             break;
//!         }
//!     }
//!     print!("{}", workbench.processes().console().text());
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod console;
pub mod editor;
pub mod error;
pub mod event;
pub mod runtime;
pub mod ui;
pub mod utils;
pub mod venv;
pub mod workbench;

// Re-export commonly used types
pub use app::{ActivePane, App};
pub use config::Settings;
pub use console::ConsoleSink;
pub use error::IdeError;
pub use event::{AppEvent, UserEvent, init_app_eventsource, init_user_event};
pub use runtime::{CommandResolver, ProcessEvent, ProcessManager, ProcessState};
pub use venv::EnvironmentManager;
pub use workbench::Workbench;
