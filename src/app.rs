//! Application state management.
//!
//! This module defines the main App struct that holds the editor buffer, the
//! workbench (environments, processes, console) and the transient UI state:
//! active pane, command mode, the open prompt and the current notice. It
//! also runs the event-driven main loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::config::Settings;
use crate::editor::files::{open_file, save_file};
use crate::editor::TextBuffer;
use crate::error::IdeError;
use crate::event::keys::{LineInput, handle_editor_key, handle_line_key};
use crate::event::{AppEvent, UserEvent, init_app_eventsource, init_user_event};
use crate::runtime::ProcessEvent;
use crate::ui::layout::AppLayout;
use crate::workbench::Workbench;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Editor,
    Console,
}

/// What the prompt line is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    OpenFile,
    SaveFile,
    CreateVenv,
    LoadVenv,
    InstallPackage,
    ConfirmQuit,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::OpenFile => "Open file: ",
            PromptKind::SaveFile => "Save file: ",
            PromptKind::CreateVenv => "Directory for virtual environment: ",
            PromptKind::LoadVenv => "Virtual environment directory: ",
            PromptKind::InstallPackage => "Enter package name: ",
            PromptKind::ConfirmQuit => "Are you sure you want to quit? (y/n) ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A blocking message box, dismissed by any key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Precondition failures are warnings, everything else is an error.
    pub fn from_error(err: &IdeError) -> Self {
        let level = match err {
            IdeError::NoEnvironmentSelected
            | IdeError::EnvironmentNotFound
            | IdeError::CommandResolution(_)
            | IdeError::ProcessAlreadyRunning { .. }
            | IdeError::NoActiveProcess => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        let title = match level {
            NoticeLevel::Warning => "Warning",
            _ => "Error",
        };
        Self {
            level,
            title: title.to_string(),
            message: err.to_string(),
        }
    }
}

pub struct App {
    // backend
    pub(crate) workbench: Workbench,
    pub(crate) editor: TextBuffer,
    pub(crate) file_path: Option<PathBuf>,

    // App State
    pub(crate) active_pane: ActivePane,
    pub(crate) command_mode: bool,
    pub(crate) prompt: Option<Prompt>,
    pub(crate) notice: Option<Notice>,
    pub(crate) console_input: String,
    pub(crate) status_message: Option<String>,
    pub(crate) clock: String,
    exit: bool,

    // Current layout - recomputed on every draw
    layout: AppLayout,

    // events sources
    user_events: Receiver<std::io::Result<UserEvent>>,
    app_events: UnboundedReceiver<AppEvent>,
    app_event_tx: UnboundedSender<AppEvent>,
    process_events: Receiver<ProcessEvent>,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self::with_user_events(settings, init_user_event())
    }

    /// Build the app reading user input from `user_events` instead of the
    /// terminal.
    pub fn with_user_events(
        settings: &Settings,
        user_events: Receiver<std::io::Result<UserEvent>>,
    ) -> Self {
        let (app_event_tx, app_events) = init_app_eventsource();
        let (workbench, process_events) = Workbench::new(settings);

        Self {
            workbench,
            editor: TextBuffer::new(),
            file_path: None,
            active_pane: ActivePane::Editor,
            command_mode: false,
            prompt: None,
            notice: None,
            console_input: String::new(),
            status_message: None,
            clock: Local::now().format("%H:%M:%S").to_string(),
            exit: false,
            layout: AppLayout::default(),
            user_events,
            app_events,
            app_event_tx,
            process_events,
        }
    }

    /// Load `path` into the editor at startup.
    pub fn open_initial_file(&mut self, path: &Path) {
        self.open(path);
    }

    /// Select an environment at startup.
    pub fn select_initial_environment(&mut self, dir: &Path) {
        if let Err(e) = self.workbench.environments_mut().select(dir) {
            self.report_error(&e);
        }
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut clock_tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            if self.exit {
                break Ok(());
            }
            tokio::select! {
                res = self.user_events.recv() => {
                    let usr_evt = res.with_context(|| anyhow::anyhow!("User event stream is ended."))?;
                    self.handle_user_event(usr_evt?);
                }
                Some(app_evt) = self.app_events.recv() => {
                    self.handle_app_event(app_evt);
                }
                Some(proc_evt) = self.process_events.recv() => {
                    self.workbench.processes_mut().handle_event(proc_evt);
                }
                _ = clock_tick.tick() => {
                    self.clock = Local::now().format("%H:%M:%S").to_string();
                }
            }
            self.draw(terminal)?;
        }
    }

    pub fn draw(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            self.layout = AppLayout::build(
                area,
                self.workbench.processes().console().is_visible(),
                self.prompt.is_some(),
            );

            use ratatui::widgets::Widget;
            (&*self).render(area, frame.buffer_mut());

            if let Some(pos) = self.cursor_position() {
                frame.set_cursor_position(pos);
            }
        })?;
        Ok(())
    }
}

// Input handling
impl App {
    pub(crate) fn handle_user_event(&mut self, event: UserEvent) {
        let UserEvent::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.notice.is_some() {
            self.notice = None;
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }
        if self.command_mode {
            self.command_mode = false;
            self.handle_command_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('b') | KeyCode::Char('B') => {
                    self.command_mode = true;
                    return;
                }
                KeyCode::Char('o') | KeyCode::Char('O') => {
                    self.open_prompt(PromptKind::OpenFile, String::new());
                    return;
                }
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    let current = self
                        .file_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    self.open_prompt(PromptKind::SaveFile, current);
                    return;
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    let result = self.workbench.run_code(&self.editor);
                    self.report(result);
                    return;
                }
                KeyCode::Char('d') | KeyCode::Char('D') => {
                    let result = self.workbench.debug_code(&self.editor);
                    self.report(result);
                    return;
                }
                _ => {}
            }
        }

        match self.active_pane {
            ActivePane::Editor => {
                handle_editor_key(&mut self.editor, key);
            }
            ActivePane::Console => self.handle_console_key(key),
        }
    }

    /// Keys pressed after the Ctrl+B prefix.
    fn handle_command_key(&mut self, key: KeyEvent) {
        let KeyCode::Char(c) = key.code else {
            return;
        };
        match c.to_ascii_lowercase() {
            'n' => self.toggle_pane(),
            'h' => self.workbench.processes_mut().console_mut().toggle(),
            'c' => self.open_prompt(PromptKind::CreateVenv, String::new()),
            'l' => self.open_prompt(PromptKind::LoadVenv, String::new()),
            'i' => {
                // the environment is checked before asking for a name
                if self.workbench.environments().selection().is_selected() {
                    self.open_prompt(PromptKind::InstallPackage, String::new());
                } else {
                    self.report_error(&IdeError::NoEnvironmentSelected);
                }
            }
            'r' => self.run_saved_file(),
            'p' => {
                let result = self.workbench.list_packages();
                self.report(result);
            }
            't' => {
                let result = self.workbench.open_shell();
                if result.is_ok() {
                    self.active_pane = ActivePane::Console;
                }
                self.report(result);
            }
            'k' => {
                let result = self.workbench.processes_mut().cancel();
                self.report(result);
            }
            'q' => self.open_prompt(PromptKind::ConfirmQuit, String::new()),
            _ => {}
        }
    }

    fn handle_console_key(&mut self, key: KeyEvent) {
        match handle_line_key(&mut self.console_input, key) {
            LineInput::Submit => {
                let mut line = std::mem::take(&mut self.console_input);
                line.push('\n');
                let result = self.workbench.processes().write_stdin(line);
                self.report(result);
            }
            LineInput::Cancel => self.console_input.clear(),
            LineInput::Pending => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };

        if prompt.kind == PromptKind::ConfirmQuit {
            let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
            self.prompt = None;
            if confirmed {
                info!("Quit confirmed");
                self.exit = true;
            }
            return;
        }

        match handle_line_key(&mut prompt.input, key) {
            LineInput::Pending => {}
            LineInput::Cancel => self.prompt = None,
            LineInput::Submit => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let input = prompt.input.trim().to_string();
        match prompt.kind {
            PromptKind::OpenFile => {
                if !input.is_empty() {
                    self.open(Path::new(&input));
                }
            }
            PromptKind::SaveFile => {
                if !input.is_empty() {
                    self.save(PathBuf::from(input));
                }
            }
            PromptKind::CreateVenv => {
                if !input.is_empty() {
                    self.create_environment(PathBuf::from(input));
                }
            }
            PromptKind::LoadVenv => {
                match self.workbench.environments_mut().select(&input) {
                    Ok(()) => {
                        self.notice = Some(Notice::info(
                            "Virtual Environment",
                            format!("Virtual environment loaded from {input}"),
                        ));
                    }
                    Err(e) => self.report_error(&e),
                }
            }
            PromptKind::InstallPackage => {
                let result = self.workbench.install_package(&input);
                self.report(result);
            }
            PromptKind::ConfirmQuit => {}
        }
    }

    /// Runs the file on disk, not the buffer, so unsaved edits are not seen.
    fn run_saved_file(&mut self) {
        let result = match self.file_path.clone() {
            Some(path) => self.workbench.run_file(&path),
            None => Err(IdeError::CommandResolution(
                "No saved file to run. Save the buffer first.".to_string(),
            )),
        };
        self.report(result);
    }

    fn open_prompt(&mut self, kind: PromptKind, input: String) {
        self.prompt = Some(Prompt { kind, input });
    }

    fn toggle_pane(&mut self) {
        self.active_pane = match self.active_pane {
            ActivePane::Editor => ActivePane::Console,
            ActivePane::Console => ActivePane::Editor,
        };
    }

    fn open(&mut self, path: &Path) {
        match open_file(path, &mut self.editor) {
            Ok(()) => {
                self.file_path = Some(path.to_path_buf());
                self.active_pane = ActivePane::Editor;
            }
            Err(e) => self.report_error(&e),
        }
    }

    fn save(&mut self, path: PathBuf) {
        match save_file(&path, &self.editor) {
            Ok(()) => {
                self.status_message = Some(format!("Saved {}", path.display()));
                self.file_path = Some(path);
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// Runs in the background; the result comes back as an [`AppEvent`].
    fn create_environment(&mut self, dir: PathBuf) {
        self.status_message = Some(format!("Creating virtual environment at {}...", dir.display()));
        let creation = self.workbench.environments().create(dir);
        let tx = self.app_event_tx.clone();
        tokio::spawn(async move {
            let result = creation.await;
            if let Err(e) = tx.send(AppEvent::EnvironmentCreated(result)) {
                error!("Failed to send EnvironmentCreated event: {:?}", e);
            }
        });
    }

    pub(crate) fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::EnvironmentCreated(result) => {
                self.status_message = None;
                match result {
                    Ok(dir) => {
                        self.notice = Some(Notice::info(
                            "Virtual Environment",
                            format!("Virtual environment created at {}", dir.display()),
                        ));
                    }
                    Err(e) => self.report_error(&e),
                }
            }
        }
    }

    fn report<T>(&mut self, result: std::result::Result<T, IdeError>) {
        if let Err(e) = result {
            self.report_error(&e);
        }
    }

    fn report_error(&mut self, err: &IdeError) {
        error!("{}", err);
        self.notice = Some(Notice::from_error(err));
    }

    /// Where the hardware cursor goes, if anywhere.
    fn cursor_position(&self) -> Option<(u16, u16)> {
        if self.notice.is_some() || self.command_mode {
            return None;
        }
        if let Some(prompt) = &self.prompt {
            let area = self.layout.prompt;
            let col = prompt.kind.label().len() + prompt.input.chars().count();
            return Some((area.x + clamp_col(col, area.width), area.y));
        }
        match self.active_pane {
            ActivePane::Editor => {
                let inner = crate::ui::inner(self.layout.editor);
                let (row, _) = self.editor.cursor();
                let scroll = crate::ui::editor_scroll(row, inner.height);
                let y = inner.y + u16::try_from(row - scroll).ok()?;
                let x = inner.x + clamp_col(self.editor.cursor_display_col(), inner.width);
                Some((x, y))
            }
            ActivePane::Console => {
                let inner = crate::ui::inner(self.layout.console);
                if inner.height == 0 {
                    return None;
                }
                let col = crate::ui::CONSOLE_INPUT_MARKER.len() + self.console_input.chars().count();
                Some((inner.x + clamp_col(col, inner.width), inner.y + inner.height - 1))
            }
        }
    }
}

fn clamp_col(col: usize, width: u16) -> u16 {
    u16::try_from(col)
        .unwrap_or(u16::MAX)
        .min(width.saturating_sub(1))
}
