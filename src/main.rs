//! Main entry point for RustyIDE.
//!
//! Parses the command line, loads settings, initializes the TUI terminal,
//! runs the main event loop and restores the terminal on exit.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use rusty_ide::app::App;
use rusty_ide::config::{Settings, default_settings_path};
use rusty_ide::utils;
use rusty_ide::utils::guard::OnExit;

#[derive(Debug, Parser)]
#[command(name = "rusty-ide", version, about = "Terminal code editor with a run console")]
struct Cli {
    /// File to open in the editor.
    file: Option<PathBuf>,

    /// Settings file (default: ~/.rusty-ide/settings.json).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Virtual environment to select at startup.
    #[arg(long, value_name = "DIR")]
    venv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging before anything else
    let _log_guard = utils::logger::init_logging();

    let settings_path = cli.config.unwrap_or_else(default_settings_path);
    let settings = Settings::load(&settings_path)?;
    tracing::info!(?settings, "Loaded settings from {}", settings_path.display());

    let mut terminal = ratatui::init();
    // restores the terminal on both normal exit and panic
    let _terminal_guard = OnExit::new(ratatui::restore);

    let mut app = App::new(&settings);
    if let Some(dir) = &cli.venv {
        app.select_initial_environment(dir);
    }
    if let Some(file) = &cli.file {
        app.open_initial_file(file);
    }

    // draw 1st frame
    app.draw(&mut terminal)?;
    // run event-driven main loop of app
    app.run(&mut terminal).await
}
