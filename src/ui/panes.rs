//! Rendering of the individual screen areas.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};

use crate::app::{ActivePane, App, Notice, NoticeLevel, Prompt};
use crate::ui::layout::centered;
use crate::ui::{CONSOLE_INPUT_MARKER, editor_scroll, inner};

const COMMAND_HINTS: &str =
    "n:pane r:run-file c:create-venv l:load-venv i:install p:list t:shell h:console k:kill q:quit";
const DEFAULT_HINTS: &str = "^R run  ^D debug  ^O open  ^S save  ^B commands";

/// Border style and title of a pane, depending on focus.
struct PaneStatus {
    title: String,
    border_color: Color,
}

impl PaneStatus {
    fn new(title: impl Into<String>, focused: bool) -> Self {
        Self {
            title: title.into(),
            border_color: if focused { Color::Cyan } else { Color::DarkGray },
        }
    }

    fn block(&self) -> Block<'_> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color))
            .title(format!(" {} ", self.title).bold())
    }
}

pub(super) fn render_editor(app: &App, area: Rect, buf: &mut Buffer) {
    let name = app
        .file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "[untitled]".to_string());
    let status = PaneStatus::new(format!("Editor: {name}"), app.active_pane == ActivePane::Editor);
    status.block().render(area, buf);

    let inner = inner(area);
    let (row, _) = app.editor.cursor();
    let scroll = editor_scroll(row, inner.height);
    let lines: Vec<Line> = app
        .editor
        .lines()
        .iter()
        .skip(scroll)
        .take(usize::from(inner.height))
        .map(|l| Line::raw(l.as_str()))
        .collect();
    Paragraph::new(lines).render(inner, buf);
}

pub(super) fn render_console(app: &App, area: Rect, buf: &mut Buffer) {
    let processes = app.workbench.processes();
    let focused = app.active_pane == ActivePane::Console;
    let status = PaneStatus::new(format!("Console [{}]", processes.state().label()), focused);
    status.block().render(area, buf);

    let inner = inner(area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    // the last row is the stdin line while the console has focus
    let output_rows = usize::from(inner.height) - usize::from(focused);
    let width = usize::from(inner.width);

    let mut rows: Vec<String> = Vec::new();
    for line in processes.console().tail_lines(output_rows) {
        if line.is_empty() {
            rows.push(String::new());
            continue;
        }
        rows.extend(textwrap::wrap(&line, width).into_iter().map(|c| c.into_owned()));
    }

    let start = rows.len().saturating_sub(output_rows);
    let mut lines: Vec<Line> = rows[start..].iter().map(|r| Line::raw(r.as_str())).collect();
    if focused {
        while lines.len() < output_rows {
            lines.push(Line::default());
        }
        lines.push(Line::from(vec![
            Span::raw(CONSOLE_INPUT_MARKER).green(),
            Span::raw(app.console_input.as_str()),
        ]));
    }
    Paragraph::new(lines).render(inner, buf);
}

pub(super) fn render_prompt(prompt: &Prompt, area: Rect, buf: &mut Buffer) {
    Line::from(vec![
        Span::raw(prompt.kind.label()).yellow().bold(),
        Span::raw(prompt.input.as_str()),
    ])
    .render(area, buf);
}

pub(super) fn render_status_bar(app: &App, area: Rect, buf: &mut Buffer) {
    let hints = if app.command_mode {
        COMMAND_HINTS.to_string()
    } else {
        app.status_message
            .clone()
            .unwrap_or_else(|| DEFAULT_HINTS.to_string())
    };
    let separator = Span::raw(" | ").dark_gray();
    let mode = if app.command_mode {
        Span::raw(" COMMAND ").black().on_yellow()
    } else {
        Span::raw(" ")
    };
    Line::from(vec![
        mode,
        Span::raw(app.clock.as_str()),
        separator.clone(),
        Span::raw(app.workbench.environments().label()).cyan(),
        separator.clone(),
        Span::raw(app.workbench.processes().state().label()),
        separator,
        Span::raw(hints).dark_gray(),
    ])
    .render(area, buf);
}

pub(super) fn render_notice(notice: &Notice, screen: Rect, buf: &mut Buffer) {
    let color = match notice.level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    };
    let width = u16::try_from(notice.message.chars().count() + 4)
        .unwrap_or(u16::MAX)
        .clamp(40, 72);
    let area = centered(screen, width, 7);
    if area.height < 3 {
        return;
    }

    Clear.render(area, buf);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", notice.title).bold());
    let lines = vec![
        Line::raw(notice.message.as_str()),
        Line::default(),
        Line::raw("Press any key to continue").dark_gray(),
    ];
    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}
