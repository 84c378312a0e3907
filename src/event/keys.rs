//! Key handling for text entry.
//!
//! The editor pane, the console input line and the prompt line all take
//! typed text; this module maps crossterm key events onto them.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::editor::TextBuffer;

/// Outcome of a key press on a single-line input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineInput {
    /// Still editing.
    Pending,
    /// Enter was pressed.
    Submit,
    /// Esc was pressed.
    Cancel,
}

/// Apply a key to a single-line input such as a prompt.
pub fn handle_line_key(line: &mut String, key: KeyEvent) -> LineInput {
    match key.code {
        KeyCode::Enter => LineInput::Submit,
        KeyCode::Esc => LineInput::Cancel,
        KeyCode::Backspace => {
            line.pop();
            LineInput::Pending
        }
        KeyCode::Char(c) if !has_command_modifier(key) => {
            line.push(c);
            LineInput::Pending
        }
        _ => LineInput::Pending,
    }
}

/// Apply a key to the editor buffer. Keys that do not edit are ignored.
pub fn handle_editor_key(editor: &mut TextBuffer, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if !has_command_modifier(key) => editor.insert_char(c),
        KeyCode::Enter => editor.insert_newline(),
        KeyCode::Tab => {
            for _ in 0..4 {
                editor.insert_char(' ');
            }
        }
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Left => editor.move_left(),
        KeyCode::Right => editor.move_right(),
        KeyCode::Up => editor.move_up(),
        KeyCode::Down => editor.move_down(),
        KeyCode::Home => editor.move_home(),
        KeyCode::End => editor.move_end(),
        _ => {}
    }
}

/// Ctrl or Alt held, i.e. the key is a shortcut rather than text.
fn has_command_modifier(key: KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}
