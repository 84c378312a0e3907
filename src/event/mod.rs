//! Event handling system for the application.
//!
//! Three sources feed the main loop:
//!
//! - **User Events**: keyboard input and resizes, read on a dedicated thread
//!   so a busy loop never delays input.
//! - **App Events**: low-frequency results of background work (environment
//!   creation).
//! - **Process Events**: output and exit notifications of the running child.
//!   These are high-frequency and live on their own channel owned by the
//!   process manager, see [`crate::runtime::ProcessManager::new`].
//!
//! # Submodules
//!
//! - `keys`: key handling for the editor, console input line and prompts

pub mod keys;

use std::io::Result;
use std::path::PathBuf;
use std::thread;

use tokio::sync::mpsc::{self, Receiver, UnboundedReceiver, UnboundedSender};

use crate::error::IdeError;

/// Type alias for user input events from the terminal.
pub type UserEvent = crossterm::event::Event;

/// Initializes the user event stream.
///
/// Spawns a thread that blocks on `crossterm::event::read()` and forwards
/// every event. The thread exits once the receiver is dropped.
pub fn init_user_event() -> Receiver<Result<UserEvent>> {
    let (tx, rx) = mpsc::channel(64);
    thread::spawn(move || {
        loop {
            if tx.blocking_send(crossterm::event::read()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Application-wide events produced by background tasks.
#[non_exhaustive]
#[derive(Debug)]
pub enum AppEvent {
    /// A create-environment request finished.
    EnvironmentCreated(std::result::Result<PathBuf, IdeError>),
}

/// Unbounded is fine here: these events are rare and small.
pub fn init_app_eventsource() -> (UnboundedSender<AppEvent>, UnboundedReceiver<AppEvent>) {
    mpsc::unbounded_channel()
}
