//! code-edit: A modeless multi-line editing core for TUI code panels
//!
//! This crate interprets key presses for a small code editor, the kind that
//! sits in one pane of a playground and edits a single buffer.
//!
//! # Shape
//!
//! - Knows nothing about terminals; keys come in as plain [`Key`] values
//! - Answers each key with [`TextEdit`]s that the host applies itself
//! - Holds only cursor state, never a copy of the buffer
//! - Modeless: every printable key inserts
//!
//! # Example
//!
//! ```
//! use code_edit::{CodeEditor, Key, KeyCode, TextEditor};
//!
//! let mut editor = CodeEditor::new();
//! let mut text = String::from("<p>hi</p>");
//!
//! editor.set_cursor(text.len(), &text);
//! let result = editor.handle_key(Key::code(KeyCode::Enter), &text);
//! result.apply_to(&mut text);
//!
//! assert_eq!(text, "<p>hi</p>\n");
//! assert_eq!(editor.cursor(), text.len());
//! ```

mod editor;

pub use editor::CodeEditor;

/// The contract between an editing core and its host application.
///
/// The editor turns keys into edits and tracks its cursor. Storing and
/// drawing the buffer are up to the host.
pub trait TextEditor {
    /// Process a key event, returning the edits to apply.
    ///
    /// `text` is the buffer as the host currently has it; motions are
    /// measured against it.
    fn handle_key(&mut self, key: Key, text: &str) -> EditResult;

    /// Current cursor position as a byte offset into the text.
    fn cursor(&self) -> usize;

    /// Set cursor position, clamped to a valid char boundary within text.
    fn set_cursor(&mut self, pos: usize, text: &str);

    /// Insert `pasted` at the cursor as-is, leaving the cursor after it.
    ///
    /// Unlike typing, pasted newlines never pick up indentation. Carriage
    /// returns are turned into newlines.
    fn paste(&mut self, pasted: &str, text: &str) -> EditResult;
}

/// Result of processing a key event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditResult {
    /// Text mutations to apply, ordered by position.
    ///
    /// Apply them in reverse so earlier offsets stay valid.
    pub edits: Vec<TextEdit>,
}

impl EditResult {
    /// Create an empty result (no changes).
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a result with a cursor move (no text change).
    pub fn cursor_only() -> Self {
        Self::default()
    }

    /// Create a result with a single edit.
    pub fn edit(edit: TextEdit) -> Self {
        Self { edits: vec![edit] }
    }

    /// Whether applying this result changes the text.
    pub fn changes_text(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Apply all edits to `text`, returning whether anything changed.
    pub fn apply_to(self, text: &mut String) -> bool {
        let changed = self.changes_text();
        for edit in self.edits.into_iter().rev() {
            edit.apply(text);
        }
        changed
    }
}

/// A single text mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    /// Delete text in the given byte range.
    Delete { start: usize, end: usize },
    /// Insert text at the given byte position.
    Insert { at: usize, text: String },
}

impl TextEdit {
    /// Apply this edit to a string.
    pub fn apply(&self, s: &mut String) {
        match self {
            TextEdit::Delete { start, end } => {
                s.replace_range(*start..*end, "");
            }
            TextEdit::Insert { at, text } => {
                s.insert_str(*at, text);
            }
        }
    }
}

/// A key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub code: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
}

impl Key {
    /// Create a plain character key.
    pub fn char(c: char) -> Self {
        Self::code(KeyCode::Char(c))
    }

    /// Create a key with just a code (no modifiers).
    pub fn code(code: KeyCode) -> Self {
        Self {
            code,
            ctrl: false,
            alt: false,
        }
    }

    /// Add ctrl modifier.
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Add alt modifier.
    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

/// Key codes the editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    Enter,
}

/// Line and column (both zero-based, column counted in chars) of a byte offset.
pub fn line_col(text: &str, pos: usize) -> (usize, usize) {
    let pos = floor_char_boundary(text, pos);
    let before = &text[..pos];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, text[line_start..pos].chars().count())
}

/// Find the largest byte index <= pos that is a valid char boundary.
pub fn floor_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        s.len()
    } else {
        let mut p = pos;
        while p > 0 && !s.is_char_boundary(p) {
            p -= 1;
        }
        p
    }
}
