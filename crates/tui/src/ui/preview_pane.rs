//! Preview Pane Widget
//!
//! A terminal approximation of the rendered page: the visible text of the
//! body, one block element per line. The real rendering is the sandboxed
//! host page, whose path is shown along the bottom border.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use std::path::Path;

/// The preview pane widget
pub struct PreviewPane<'a> {
    /// Visible text of the last rendered document
    lines: &'a [String],
    /// Where the sandboxed page is written, if anywhere
    page: Option<&'a Path>,
    /// Blank the content (while a divider is being dragged)
    hidden: bool,
}

impl<'a> PreviewPane<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        Self {
            lines,
            page: None,
            hidden: false,
        }
    }

    pub fn page(mut self, page: Option<&'a Path>) -> Self {
        self.page = page;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    fn block(&self) -> Block<'a> {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " Preview ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ));
        if let Some(page) = self.page {
            block = block.title_bottom(Span::styled(
                format!(" sandbox: allow-scripts | {} ", page.display()),
                Style::default().fg(Color::DarkGray),
            ));
        }
        block
    }
}

impl Widget for &PreviewPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        if self.hidden {
            block.render(area, buf);
            return;
        }

        let lines: Vec<Line> = if self.lines.is_empty() {
            vec![Line::from(Span::styled(
                "(nothing to show)",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.lines
                .iter()
                .map(|line| Line::from(line.as_str()))
                .collect()
        };

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
