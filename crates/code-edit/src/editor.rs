//! Modeless code editor implementation.

use crate::{EditResult, Key, KeyCode, TextEdit, TextEditor, floor_char_boundary};

/// Number of columns a Tab advances to.
const TAB_WIDTH: usize = 2;

/// Default number of lines PageUp/PageDown move when the host hasn't said.
const DEFAULT_PAGE_LINES: usize = 20;

/// A modeless multi-line editor.
///
/// Every printable key inserts at the cursor. Vertical motion remembers the
/// column it started from, so moving through a short line and back keeps
/// the original column.
#[derive(Debug, Clone)]
pub struct CodeEditor {
    cursor: usize,
    /// Column (in chars) that Up/Down try to return to.
    preferred_col: Option<usize>,
    page_lines: usize,
}

impl Default for CodeEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeEditor {
    /// Create a new editor with the cursor at the start of the buffer.
    pub fn new() -> Self {
        Self {
            cursor: 0,
            preferred_col: None,
            page_lines: DEFAULT_PAGE_LINES,
        }
    }

    /// Set how many lines PageUp/PageDown move (usually the visible height).
    pub fn set_page_lines(&mut self, lines: usize) {
        self.page_lines = lines.max(1);
    }

    fn clamp_cursor(&mut self, text: &str) {
        self.cursor = floor_char_boundary(text, self.cursor);
    }

    fn move_left(&mut self, text: &str) {
        if let Some((idx, _)) = text[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    fn move_right(&mut self, text: &str) {
        if let Some(c) = text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    /// Home goes to the first non-blank char, or to column 0 if already there.
    fn move_home(&mut self, text: &str) {
        let start = line_start(text, self.cursor);
        let indent_end = start + leading_whitespace(&text[start..line_end(text, self.cursor)]).len();
        self.cursor = if self.cursor == indent_end {
            start
        } else {
            indent_end
        };
    }

    fn move_end(&mut self, text: &str) {
        self.cursor = line_end(text, self.cursor);
    }

    /// Move `lines` lines up (negative) or down (positive), keeping the column.
    fn move_vertical(&mut self, text: &str, lines: isize) {
        let start = line_start(text, self.cursor);
        let col = *self
            .preferred_col
            .get_or_insert_with(|| text[start..self.cursor].chars().count());

        let mut target = start;
        if lines < 0 {
            for _ in 0..lines.unsigned_abs() {
                if target == 0 {
                    break;
                }
                target = line_start(text, target - 1);
            }
        } else {
            for _ in 0..lines {
                match text[target..].find('\n') {
                    Some(i) => target += i + 1,
                    None => break,
                }
            }
        }

        self.cursor = offset_at_column(text, target, col);
    }

    fn insert(&mut self, s: String) -> EditResult {
        let at = self.cursor;
        self.cursor = at + s.len();
        EditResult::edit(TextEdit::Insert { at, text: s })
    }

    /// Enter inserts a newline carrying the current line's indentation.
    fn newline(&mut self, text: &str) -> EditResult {
        let start = line_start(text, self.cursor);
        let indent = leading_whitespace(&text[start..self.cursor]);
        self.insert(format!("\n{}", indent))
    }

    /// Tab inserts spaces up to the next tab stop.
    fn indent(&mut self, text: &str) -> EditResult {
        let start = line_start(text, self.cursor);
        let col = text[start..self.cursor].chars().count();
        let width = TAB_WIDTH - col % TAB_WIDTH;
        self.insert(" ".repeat(width))
    }

    fn backspace(&mut self, text: &str) -> EditResult {
        let Some((start, _)) = text[..self.cursor].char_indices().next_back() else {
            return EditResult::none();
        };
        let end = self.cursor;
        self.cursor = start;
        EditResult::edit(TextEdit::Delete { start, end })
    }

    fn delete_forward(&mut self, text: &str) -> EditResult {
        match text[self.cursor..].chars().next() {
            Some(c) => EditResult::edit(TextEdit::Delete {
                start: self.cursor,
                end: self.cursor + c.len_utf8(),
            }),
            None => EditResult::none(),
        }
    }
}

impl TextEditor for CodeEditor {
    fn handle_key(&mut self, key: Key, text: &str) -> EditResult {
        self.clamp_cursor(text);

        // Only vertical motion keeps the remembered column
        if !matches!(
            key.code,
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown
        ) {
            self.preferred_col = None;
        }

        match key.code {
            KeyCode::Char(c) if !key.ctrl && !key.alt => self.insert(c.to_string()),
            KeyCode::Char(_) => EditResult::none(),
            KeyCode::Enter => self.newline(text),
            KeyCode::Tab => self.indent(text),
            KeyCode::Backspace => self.backspace(text),
            KeyCode::Delete => self.delete_forward(text),
            KeyCode::Left => {
                self.move_left(text);
                EditResult::cursor_only()
            }
            KeyCode::Right => {
                self.move_right(text);
                EditResult::cursor_only()
            }
            KeyCode::Up => {
                self.move_vertical(text, -1);
                EditResult::cursor_only()
            }
            KeyCode::Down => {
                self.move_vertical(text, 1);
                EditResult::cursor_only()
            }
            KeyCode::PageUp => {
                self.move_vertical(text, -(self.page_lines as isize));
                EditResult::cursor_only()
            }
            KeyCode::PageDown => {
                self.move_vertical(text, self.page_lines as isize);
                EditResult::cursor_only()
            }
            KeyCode::Home if key.ctrl => {
                self.cursor = 0;
                EditResult::cursor_only()
            }
            KeyCode::End if key.ctrl => {
                self.cursor = text.len();
                EditResult::cursor_only()
            }
            KeyCode::Home => {
                self.move_home(text);
                EditResult::cursor_only()
            }
            KeyCode::End => {
                self.move_end(text);
                EditResult::cursor_only()
            }
        }
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, pos: usize, text: &str) {
        self.cursor = floor_char_boundary(text, pos);
        self.preferred_col = None;
    }

    fn paste(&mut self, pasted: &str, text: &str) -> EditResult {
        self.clamp_cursor(text);
        self.preferred_col = None;
        if pasted.is_empty() {
            return EditResult::none();
        }
        self.insert(pasted.replace("\r\n", "\n").replace('\r', "\n"))
    }
}

/// Byte offset of the start of the line containing `pos`.
fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Byte offset of the end of the line containing `pos` (its newline, or EOF).
fn line_end(text: &str, pos: usize) -> usize {
    text[pos..]
        .find('\n')
        .map(|i| pos + i)
        .unwrap_or(text.len())
}

/// Offset of char column `col` on the line starting at `start`, or the line end.
fn offset_at_column(text: &str, start: usize, col: usize) -> usize {
    let end = line_end(text, start);
    text[start..end]
        .char_indices()
        .nth(col)
        .map(|(i, _)| start + i)
        .unwrap_or(end)
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}
