//! Editor Pane Widget
//!
//! One bordered code panel per language:
//! - Title naming the language, highlighted when focused, and the bound
//!   language identifier along the bottom border
//! - Token highlighting for the panel's language
//! - Block cursor, with the view scrolled to keep it visible

use crate::ui::highlight::{TokenKind, tokenize};
use code_edit::{floor_char_boundary, line_col};
use playground::Language;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Style for a token kind
pub fn token_style(kind: TokenKind) -> Style {
    match kind {
        TokenKind::Tag => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        TokenKind::Attribute => Style::default().fg(Color::Cyan),
        TokenKind::String => Style::default().fg(Color::Green),
        TokenKind::Comment => Style::default().fg(Color::DarkGray),
        TokenKind::Selector => Style::default().fg(Color::Yellow),
        TokenKind::Property => Style::default().fg(Color::Cyan),
        TokenKind::Value => Style::default().fg(Color::White),
        TokenKind::Keyword => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        TokenKind::Number => Style::default().fg(Color::LightBlue),
        TokenKind::Punctuation => Style::default().fg(Color::Gray),
        TokenKind::Identifier => Style::default().fg(Color::White),
        TokenKind::Text => Style::default(),
    }
}

/// Highlight `source` into display lines.
///
/// Tabs are shown as single spaces so display columns match char columns.
pub fn highlight_lines(language: Language, source: &str) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];
    for token in tokenize(language, source) {
        let style = token_style(token.kind);
        for (i, piece) in source[token.span].split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            if !piece.is_empty()
                && let Some(line) = lines.last_mut()
            {
                line.spans
                    .push(Span::styled(piece.replace('\t', " "), style));
            }
        }
    }
    lines
}

/// Terminal column of `pos` within its line.
///
/// Wide characters take two cells; tabs take one, as drawn.
fn display_column(text: &str, pos: usize) -> usize {
    let pos = floor_char_boundary(text, pos);
    let start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    text[start..pos]
        .chars()
        .map(|c| if c == '\t' { 1 } else { c.width().unwrap_or(0) })
        .sum()
}

/// Scroll offset as ratatui wants it, saturating on huge buffers
fn scroll_offset(offset: usize) -> u16 {
    u16::try_from(offset).unwrap_or(u16::MAX)
}

/// First visible index so that `target` stays inside a window of `size`
fn scroll_to_show(target: usize, size: usize) -> usize {
    if size == 0 {
        return target;
    }
    target.saturating_sub(size - 1)
}

/// The editor pane widget
pub struct EditorPane<'a> {
    language: Language,
    text: &'a str,
    cursor: usize,
    focused: bool,
}

impl<'a> EditorPane<'a> {
    pub fn new(language: Language, text: &'a str, cursor: usize) -> Self {
        Self {
            language,
            text,
            cursor,
            focused: false,
        }
    }

    /// Set whether the pane is focused
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn block(&self) -> Block<'static> {
        let (border, title) = if self.focused {
            (
                Style::default().fg(Color::Cyan),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (
                Style::default().fg(Color::DarkGray),
                Style::default().fg(Color::Gray),
            )
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(format!(" {} ", self.language.label()), title))
            .title_bottom(
                Line::from(Span::styled(format!(" {} ", self.language.id()), border))
                    .right_aligned(),
            )
    }
}

impl Widget for &EditorPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let (line, _) = line_col(self.text, self.cursor);
        let col = display_column(self.text, self.cursor);
        let top = scroll_offset(scroll_to_show(line, inner.height as usize));
        let left = scroll_offset(scroll_to_show(col, inner.width as usize));

        let lines = highlight_lines(self.language, self.text);
        Paragraph::new(lines).scroll((top, left)).render(inner, buf);

        if self.focused
            && let Ok(dx) = u16::try_from(col - usize::from(left))
            && let Ok(dy) = u16::try_from(line - usize::from(top))
            && let Some(cell) =
                buf.cell_mut((inner.x.saturating_add(dx), inner.y.saturating_add(dy)))
        {
            cell.set_style(Style::default().bg(Color::White).fg(Color::Black));
        }
    }
}
