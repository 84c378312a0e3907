//! User interface module for the TUI application.
//!
//! The screen is the editor pane on top, the console pane below it (hidden
//! until a process starts or it is toggled), an optional prompt line and a
//! one-line status bar. Notices are drawn as a popup over everything else.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Widget};

use crate::app::App;
use crate::ui::layout::AppLayout;

pub mod layout;
mod panes;

/// Drawn in front of the console's stdin line.
pub const CONSOLE_INPUT_MARKER: &str = "> ";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = AppLayout::build(
            area,
            self.workbench.processes().console().is_visible(),
            self.prompt.is_some(),
        );

        panes::render_editor(self, layout.editor, buf);
        if layout.console.height > 0 {
            panes::render_console(self, layout.console, buf);
        }
        if let Some(prompt) = &self.prompt {
            panes::render_prompt(prompt, layout.prompt, buf);
        }
        panes::render_status_bar(self, layout.status, buf);

        if let Some(notice) = &self.notice {
            panes::render_notice(notice, area, buf);
        }
    }
}

/// Content area of a bordered pane.
pub fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// First visible editor row so that `cursor_row` stays on screen.
pub fn editor_scroll(cursor_row: usize, height: u16) -> usize {
    cursor_row.saturating_sub(usize::from(height.max(1)) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn render(app: &App, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    fn app() -> App {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        App::with_user_events(&Settings::default(), rx)
    }

    #[test]
    fn test_editor_scroll_follows_cursor() {
        assert_eq!(editor_scroll(0, 10), 0);
        assert_eq!(editor_scroll(9, 10), 0);
        assert_eq!(editor_scroll(10, 10), 1);
        assert_eq!(editor_scroll(5, 0), 5);
    }

    #[test]
    fn test_status_bar_shows_environment_and_state() {
        let app = app();
        let screen = render(&app, 80, 12);
        let status = screen.last().unwrap();
        assert!(status.contains("Venv: Not Loaded"), "{status}");
        assert!(status.contains("idle"), "{status}");
    }

    #[test]
    fn test_console_hidden_until_shown() {
        let mut app = app();
        let screen = render(&app, 60, 12).join("\n");
        assert!(!screen.contains("Console"));

        app.workbench.processes_mut().console_mut().append("hello from child\n");
        app.workbench.processes_mut().console_mut().show();
        let screen = render(&app, 60, 12).join("\n");
        assert!(screen.contains("Console"));
        assert!(screen.contains("hello from child"));
    }

    #[test]
    fn test_console_shows_newest_wrapped_rows() {
        let mut app = app();
        let console = app.workbench.processes_mut().console_mut();
        for i in 0..5_000 {
            console.append(format!("out {i}\n"));
        }
        console.append(format!("{}\n", "x".repeat(70)));
        console.show();

        let screen = render(&app, 40, 14).join("\n");
        assert!(screen.contains("out 4999"));
        assert!(!screen.contains("out 0 "));
        // the long last line wraps onto two rows
        assert!(screen.contains(&"x".repeat(38)));
        assert!(screen.contains(&"x".repeat(32)));
    }

    #[test]
    fn test_notice_is_drawn_on_top() {
        let mut app = app();
        app.handle_user_event(crossterm::event::Event::Key(KeyEvent::new(
            KeyCode::Char('b'),
            KeyModifiers::CONTROL,
        )));
        app.handle_user_event(crossterm::event::Event::Key(KeyEvent::new(
            KeyCode::Char('p'),
            KeyModifiers::NONE,
        )));

        let screen = render(&app, 80, 20).join("\n");
        assert!(screen.contains("No virtual environment loaded."));
    }
}
