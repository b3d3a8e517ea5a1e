use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a keystroke did to the pending input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Enter without modifiers: send the current buffer.
    Submitted,
    /// The buffer or cursor changed and the input box needs a redraw.
    Edited,
    /// The key meant nothing to the input box.
    Ignored,
}

/// The not-yet-sent text buffer.
///
/// Cursor is a char index into the buffer. Enter commits, Shift+Enter inserts
/// a literal newline (the commit key's default effect is suppressed by the
/// caller simply not inserting anything on `Submitted`).
pub struct InputController {
    buffer: String,
    cursor: usize,
}

impl InputController {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// The send affordance is live only with real content and an idle
    /// dispatcher.
    pub fn send_enabled(&self, idle: bool) -> bool {
        idle && !self.is_blank()
    }

    /// Cursor position as (row, column) in character cells, for terminal
    /// cursor placement.
    pub fn cursor_position(&self) -> (u16, u16) {
        let before = &self.buffer[..self.byte_index()];
        let row = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|line| line.chars().count())
            .unwrap_or(0);
        (row as u16, col as u16)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Enter if key.modifiers == KeyModifiers::SHIFT => {
                self.insert('\n');
                InputAction::Edited
            }
            KeyCode::Enter if key.modifiers.is_empty() => InputAction::Submitted,
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.insert(ch);
                InputAction::Edited
            }
            KeyCode::Backspace => {
                self.delete_before_cursor();
                InputAction::Edited
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                InputAction::Edited
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
                InputAction::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                InputAction::Edited
            }
            KeyCode::End => {
                self.cursor = self.buffer.chars().count();
                InputAction::Edited
            }
            _ => InputAction::Ignored,
        }
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }

    fn insert(&mut self, ch: char) {
        let at = self.byte_index();
        self.buffer.insert(at, ch);
        self.cursor += 1;
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.buffer.remove(at);
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}
