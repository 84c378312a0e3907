//! Single-child process lifecycle and console streaming.
//!
//! `ProcessManager` owns at most one live child. Its stdout and stderr share
//! one pipe, so the console sees a single interleaved stream in the order
//! the OS delivered it. A reader thread pushes decoded chunks and a watcher
//! task pushes the exit status through one channel; the app loop feeds each
//! event back through [`ProcessManager::handle_event`], which is the only
//! place the console is written while a child runs.

use std::fmt;
use std::io::Read;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::console::{ConsoleSink, OutputDecoder};
use crate::error::{IdeError, Result};

use super::Invocation;

// Channel buffer sizes
const PROCESS_EVENT_BUFFER: usize = 1024;
const PIPE_READ_BUFFER: usize = 8192;

/// How long to wait for the output pipe to drain once the child has exited.
/// A grandchild can keep the pipe open indefinitely.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Idle,
    Starting,
    Running,
    Completed { exit_code: Option<i32> },
    FailedToStart,
}

impl ProcessState {
    /// Starting or Running.
    pub fn is_active(self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Running)
    }

    pub fn label(self) -> String {
        match self {
            ProcessState::Idle => "idle".to_string(),
            ProcessState::Starting => "starting".to_string(),
            ProcessState::Running => "running".to_string(),
            ProcessState::Completed { exit_code: Some(code) } => format!("exited ({code})"),
            ProcessState::Completed { exit_code: None } => "killed".to_string(),
            ProcessState::FailedToStart => "failed to start".to_string(),
        }
    }
}

/// Notifications pushed from a child's reader thread and watcher task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A decoded chunk of merged stdout/stderr.
    Output { id: ProcessId, text: String },
    /// The child terminated. `exit_code` is `None` when it was killed by a signal.
    Exited { id: ProcessId, exit_code: Option<i32> },
}

impl ProcessEvent {
    pub fn id(&self) -> ProcessId {
        match self {
            ProcessEvent::Output { id, .. } | ProcessEvent::Exited { id, .. } => *id,
        }
    }
}

/// Record of one launched child.
#[derive(Debug)]
pub struct ManagedProcess {
    id: ProcessId,
    invocation: Invocation,
    state: ProcessState,
    exit_code: Option<i32>,
    kill_switch: Option<oneshot::Sender<()>>,
    stdin: Option<UnboundedSender<Vec<u8>>>,
}

impl ManagedProcess {
    fn new(id: ProcessId, invocation: Invocation) -> Self {
        Self {
            id,
            invocation,
            state: ProcessState::Starting,
            exit_code: None,
            kill_switch: None,
            stdin: None,
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Present only once the child has terminated with a code.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    fn release_handles(&mut self) {
        self.kill_switch = None;
        self.stdin = None;
    }
}

/// Owns the console and the (at most one) active child process.
pub struct ProcessManager {
    console: ConsoleSink,
    current: Option<ManagedProcess>,
    next_id: u64,
    event_tx: Sender<ProcessEvent>,
}

impl ProcessManager {
    /// Creates a manager writing into `console`.
    ///
    /// # Returns
    /// A tuple of (ProcessManager, Receiver for process events). The receiver
    /// must be drained by the caller's event loop and every event handed back
    /// to [`ProcessManager::handle_event`].
    pub fn new(console: ConsoleSink) -> (Self, Receiver<ProcessEvent>) {
        let (event_tx, event_rx) = mpsc::channel(PROCESS_EVENT_BUFFER);
        (
            Self {
                console,
                current: None,
                next_id: 1,
                event_tx,
            },
            event_rx,
        )
    }

    pub fn console(&self) -> &ConsoleSink {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut ConsoleSink {
        &mut self.console
    }

    pub fn current(&self) -> Option<&ManagedProcess> {
        self.current.as_ref()
    }

    pub fn state(&self) -> ProcessState {
        self.current
            .as_ref()
            .map(|p| p.state)
            .unwrap_or(ProcessState::Idle)
    }

    /// Launch `invocation` as the tracked child.
    ///
    /// Rejected with [`IdeError::ProcessAlreadyRunning`] while another child
    /// is live; the console is left untouched in that case. Otherwise the
    /// console is cleared and shown before the spawn, and this returns as
    /// soon as the OS has created the process.
    pub fn start(&mut self, invocation: Invocation) -> Result<ProcessId> {
        if let Some(active) = self.current.as_ref().filter(|p| p.state.is_active()) {
            warn!(process = %active.id, "Start rejected, a process is still running");
            return Err(IdeError::ProcessAlreadyRunning { id: active.id });
        }

        self.console.clear();
        self.console.show();

        let id = ProcessId(self.next_id);
        self.next_id += 1;
        let mut process = ManagedProcess::new(id, invocation);
        info!(process = %id, command = %process.invocation, "Starting process");

        match spawn_child(id, &process.invocation, self.event_tx.clone()) {
            Ok(handles) => {
                process.state = ProcessState::Running;
                process.kill_switch = Some(handles.kill_switch);
                process.stdin = Some(handles.stdin);
                self.current = Some(process);
                Ok(id)
            }
            Err(source) => {
                error!(process = %id, "Failed to spawn: {}", source);
                let command = process.invocation.program.display().to_string();
                process.state = ProcessState::FailedToStart;
                self.current = Some(process);
                Err(IdeError::ProcessLaunch { command, source })
            }
        }
    }

    /// Apply one pushed event to the console and lifecycle state.
    ///
    /// Events from a child that is no longer tracked are dropped. Output that
    /// trails the exit notification is still appended, after the completion
    /// line.
    pub fn handle_event(&mut self, event: ProcessEvent) {
        let Some(process) = self.current.as_mut().filter(|p| p.id == event.id()) else {
            debug!(process = %event.id(), "Dropping event from untracked process");
            return;
        };

        match event {
            ProcessEvent::Output { text, .. } => self.console.append(text),
            ProcessEvent::Exited { exit_code, .. } => {
                if !process.state.is_active() {
                    debug!(process = %process.id, "Ignoring repeated exit notification");
                    return;
                }
                info!(process = %process.id, ?exit_code, "Process finished");
                process.state = ProcessState::Completed { exit_code };
                process.exit_code = exit_code;
                process.release_handles();

                let mut line = completion_line(exit_code);
                if self.console.chunks().last().is_some_and(|c| !c.ends_with('\n')) {
                    line.insert(0, '\n');
                }
                self.console.append(line);
            }
        }
    }

    /// Kill the running child. Completion still arrives as a normal
    /// [`ProcessEvent::Exited`].
    pub fn cancel(&mut self) -> Result<ProcessId> {
        let process = self
            .current
            .as_mut()
            .filter(|p| p.state.is_active())
            .ok_or(IdeError::NoActiveProcess)?;

        if let Some(kill) = process.kill_switch.take() {
            info!(process = %process.id, "Cancelling process");
            if kill.send(()).is_err() {
                debug!(process = %process.id, "Watcher already gone");
            }
        }
        Ok(process.id)
    }

    /// Forward raw bytes to the running child's stdin.
    pub fn write_stdin(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let stdin = self
            .current
            .as_ref()
            .filter(|p| p.state.is_active())
            .and_then(|p| p.stdin.as_ref())
            .ok_or(IdeError::NoActiveProcess)?;
        stdin.send(bytes.into()).map_err(|_| IdeError::NoActiveProcess)
    }
}

/// The console line appended when a child terminates.
pub fn completion_line(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("Process finished with exit code {code}\n"),
        None => "Process terminated by signal\n".to_string(),
    }
}

struct ChildHandles {
    kill_switch: oneshot::Sender<()>,
    stdin: UnboundedSender<Vec<u8>>,
}

fn spawn_child(
    id: ProcessId,
    invocation: &Invocation,
    events: Sender<ProcessEvent>,
) -> std::io::Result<ChildHandles> {
    let (reader, writer) = std::io::pipe()?;

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::piped())
        .stdout(writer.try_clone()?)
        .stderr(writer)
        .kill_on_drop(true);

    let mut child = command.spawn()?;
    // The command still holds our copies of the pipe's write end; the reader
    // only sees EOF once they are closed.
    drop(command);

    let (drained_tx, drained_rx) = oneshot::channel();
    spawn_reader(id, reader, events.clone(), drained_tx);

    let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
    if let Some(stdin) = child.stdin.take() {
        tokio::spawn(forward_stdin(id, stdin, stdin_rx));
    }

    let (kill_tx, kill_rx) = oneshot::channel();
    tokio::spawn(watch_child(id, child, kill_rx, drained_rx, events));

    Ok(ChildHandles {
        kill_switch: kill_tx,
        stdin: stdin_tx,
    })
}

fn spawn_reader(
    id: ProcessId,
    reader: std::io::PipeReader,
    events: Sender<ProcessEvent>,
    drained: oneshot::Sender<()>,
) {
    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; PIPE_READ_BUFFER];
        let mut decoder = OutputDecoder::new();

        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let text = decoder.decode(&buf[..n]);
                    if text.is_empty() {
                        continue;
                    }
                    // Use blocking_send since we're in a std::thread
                    if events.blocking_send(ProcessEvent::Output { id, text }).is_err() {
                        // Receiver dropped, exit thread
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(process = %id, "Output pipe read error: {}", e);
                    break;
                }
            }
        }

        let rest = decoder.finish();
        if !rest.is_empty() && events.blocking_send(ProcessEvent::Output { id, text: rest }).is_err() {
            return;
        }
        if drained.send(()).is_err() {
            debug!(process = %id, "Watcher stopped waiting for output");
        }
    });
}

async fn forward_stdin(id: ProcessId, mut stdin: ChildStdin, mut input: UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = input.recv().await {
        if let Err(e) = stdin.write_all(&bytes).await {
            debug!(process = %id, "Stdin closed: {}", e);
            break;
        }
        if let Err(e) = stdin.flush().await {
            debug!(process = %id, "Stdin flush failed: {}", e);
            break;
        }
    }
}

async fn watch_child(
    id: ProcessId,
    mut child: Child,
    kill_switch: oneshot::Receiver<()>,
    drained: oneshot::Receiver<()>,
    events: Sender<ProcessEvent>,
) {
    // The kill switch also fires when its sender is dropped, which happens
    // when the owning manager goes away.
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill_switch => {
            if let Err(e) = child.start_kill() {
                warn!(process = %id, "Failed to kill process: {}", e);
            }
            child.wait().await
        }
    };

    let exit_code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            error!(process = %id, "Failed to wait for process: {}", e);
            None
        }
    };

    if tokio::time::timeout(READER_DRAIN_TIMEOUT, drained).await.is_err() {
        debug!(process = %id, "Output pipe still open after exit");
    }

    if events.send(ProcessEvent::Exited { id, exit_code }).await.is_err() {
        debug!(process = %id, "Exit event dropped, receiver closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn pump_until_exit(manager: &mut ProcessManager, events: &mut Receiver<ProcessEvent>) {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
                .await
                .expect("timed out waiting for process event")
                .expect("event channel closed");
            let exited = matches!(event, ProcessEvent::Exited { .. });
            manager.handle_event(event);
            if exited {
                break;
            }
        }
    }

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh", ["-c", script])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_simulated_output_then_exit() {
        let (mut manager, _events) = ProcessManager::new(ConsoleSink::new());
        let id = manager.start(Invocation::new("sleep", ["5"])).unwrap();
        assert_eq!(manager.state(), ProcessState::Running);

        manager.handle_event(ProcessEvent::Output { id, text: "A".to_string() });
        manager.handle_event(ProcessEvent::Output { id, text: "B".to_string() });
        manager.handle_event(ProcessEvent::Exited { id, exit_code: Some(0) });

        assert_eq!(
            manager.console().chunks(),
            ["A", "B", "\nProcess finished with exit code 0\n"]
        );
        assert_eq!(manager.state(), ProcessState::Completed { exit_code: Some(0) });
        assert_eq!(manager.current().unwrap().exit_code(), Some(0));
    }

    #[tokio::test]
    async fn test_unlaunchable_command_fails_to_start() {
        let (mut manager, mut events) = ProcessManager::new(ConsoleSink::new());
        manager.console_mut().append("previous run");

        let err = manager
            .start(Invocation::new("/definitely/not/a/real/binary", ["--x"]))
            .unwrap_err();

        assert!(matches!(err, IdeError::ProcessLaunch { .. }));
        assert_eq!(manager.state(), ProcessState::FailedToStart);
        assert!(manager.console().is_empty());
        assert!(manager.console().is_visible());
        assert!(events.try_recv().is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_and_stderr_are_merged_in_order() {
        let (mut manager, mut events) = ProcessManager::new(ConsoleSink::new());
        manager.start(sh("echo out; echo err 1>&2; exit 3")).unwrap();
        pump_until_exit(&mut manager, &mut events).await;

        assert_eq!(
            manager.console().text(),
            "out\nerr\nProcess finished with exit code 3\n"
        );
        assert_eq!(manager.state(), ProcessState::Completed { exit_code: Some(3) });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_while_running_is_rejected() {
        let (mut manager, _events) = ProcessManager::new(ConsoleSink::new());
        let first = manager.start(Invocation::new("sleep", ["5"])).unwrap();
        manager.handle_event(ProcessEvent::Output { id: first, text: "kept".to_string() });

        let err = manager.start(sh("echo nope")).unwrap_err();

        assert!(matches!(err, IdeError::ProcessAlreadyRunning { id } if id == first));
        assert_eq!(manager.console().chunks(), ["kept"]);
        assert_eq!(manager.current().unwrap().id(), first);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_next_start_clears_previous_output() {
        let (mut manager, mut events) = ProcessManager::new(ConsoleSink::new());
        manager.start(sh("printf first")).unwrap();
        pump_until_exit(&mut manager, &mut events).await;

        manager.start(sh("printf second")).unwrap();
        pump_until_exit(&mut manager, &mut events).await;

        assert_eq!(manager.console().chunks()[0], "second");
        assert!(!manager.console().text().contains("first"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_and_reports() {
        let (mut manager, mut events) = ProcessManager::new(ConsoleSink::new());
        let id = manager.start(Invocation::new("sleep", ["30"])).unwrap();

        assert_eq!(manager.cancel().unwrap(), id);
        pump_until_exit(&mut manager, &mut events).await;

        assert_eq!(manager.state(), ProcessState::Completed { exit_code: None });
        assert_eq!(
            manager.console().chunks().last().map(String::as_str),
            Some("Process terminated by signal\n")
        );
        assert!(matches!(manager.cancel(), Err(IdeError::NoActiveProcess)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdin_is_forwarded() {
        let (mut manager, mut events) = ProcessManager::new(ConsoleSink::new());
        manager.start(sh("read line; echo got $line")).unwrap();
        manager.write_stdin("hello\n").unwrap();
        pump_until_exit(&mut manager, &mut events).await;

        assert!(manager.console().text().starts_with("got hello\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_events_from_other_process_are_dropped() {
        let (mut manager, _events) = ProcessManager::new(ConsoleSink::new());
        let id = manager.start(Invocation::new("sleep", ["5"])).unwrap();

        manager.handle_event(ProcessEvent::Output {
            id: ProcessId(999),
            text: "stray".to_string(),
        });
        manager.handle_event(ProcessEvent::Exited { id: ProcessId(999), exit_code: Some(1) });

        assert!(manager.console().is_empty());
        assert_eq!(manager.state(), ProcessState::Running);
        assert_eq!(manager.current().unwrap().id(), id);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_after_exit_is_appended_after_completion() {
        let (mut manager, _events) = ProcessManager::new(ConsoleSink::new());
        let id = manager.start(Invocation::new("sleep", ["5"])).unwrap();

        manager.handle_event(ProcessEvent::Output { id, text: "line\n".to_string() });
        manager.handle_event(ProcessEvent::Exited { id, exit_code: Some(2) });
        manager.handle_event(ProcessEvent::Output { id, text: "late".to_string() });
        manager.handle_event(ProcessEvent::Exited { id, exit_code: Some(2) });

        assert_eq!(
            manager.console().chunks(),
            ["line\n", "Process finished with exit code 2\n", "late"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_grandchild_holding_pipe_does_not_delay_exit() {
        let (mut manager, mut events) = ProcessManager::new(ConsoleSink::new());
        let started = std::time::Instant::now();
        manager.start(sh("sleep 3 & echo hi")).unwrap();
        pump_until_exit(&mut manager, &mut events).await;

        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
        assert_eq!(
            manager.console().text(),
            "hi\nProcess finished with exit code 0\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dropping_manager_kills_child() {
        fn alive(pid: &str) -> bool {
            std::process::Command::new("kill")
                .args(["-0", pid])
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|s| s.success())
        }

        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let (mut manager, _events) = ProcessManager::new(ConsoleSink::new());
        manager
            .start(sh(&format!("echo $$ > {}; exec sleep 30", pid_file.display())))
            .unwrap();

        let mut pid = String::new();
        for _ in 0..100 {
            pid = std::fs::read_to_string(&pid_file).unwrap_or_default().trim().to_string();
            if !pid.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!pid.is_empty(), "child never wrote its pid");
        assert!(alive(&pid));

        drop(manager);

        let mut dead = false;
        for _ in 0..100 {
            if !alive(&pid) {
                dead = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(dead, "child {pid} still running after the manager was dropped");
    }

    #[test]
    fn test_idle_without_process() {
        let (manager, _events) = ProcessManager::new(ConsoleSink::new());
        assert_eq!(manager.state(), ProcessState::Idle);
        assert!(matches!(manager.write_stdin("x"), Err(IdeError::NoActiveProcess)));
    }
}
