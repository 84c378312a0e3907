//! Screen areas for the current frame.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Editor height share (percent) while the console is shown.
const EDITOR_SHARE: u16 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppLayout {
    pub editor: Rect,
    /// Zero-sized while the console is hidden.
    pub console: Rect,
    /// Zero-sized while no prompt is open.
    pub prompt: Rect,
    pub status: Rect,
}

impl AppLayout {
    pub fn build(area: Rect, console_visible: bool, prompt_open: bool) -> Self {
        let [main, prompt, status] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(u16::from(prompt_open)),
                Constraint::Length(1),
            ])
            .areas(area);

        let (editor, console) = if console_visible {
            let [editor, console] = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(EDITOR_SHARE),
                    Constraint::Percentage(100 - EDITOR_SHARE),
                ])
                .areas(main);
            (editor, console)
        } else {
            (main, Rect::default())
        };

        Self {
            editor,
            console,
            prompt,
            status,
        }
    }
}

/// A `width` x `height` rect centered in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_hidden_gives_editor_everything() {
        let layout = AppLayout::build(Rect::new(0, 0, 80, 24), false, false);
        assert_eq!(layout.editor.height, 23);
        assert_eq!(layout.console.area(), 0);
        assert_eq!(layout.prompt.height, 0);
        assert_eq!(layout.status, Rect::new(0, 23, 80, 1));
    }

    #[test]
    fn test_console_and_prompt_visible() {
        let layout = AppLayout::build(Rect::new(0, 0, 80, 24), true, true);
        assert_eq!(layout.prompt, Rect::new(0, 22, 80, 1));
        assert!(layout.console.height > 0);
        assert_eq!(layout.editor.height + layout.console.height, 22);
        assert_eq!(layout.console.y, layout.editor.y + layout.editor.height);
    }

    #[test]
    fn test_centered_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered(area, 10, 4), Rect::new(5, 3, 10, 4));
        assert_eq!(centered(area, 50, 50), area);
    }
}
