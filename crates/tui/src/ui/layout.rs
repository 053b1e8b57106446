//! Layout Manager
//!
//! Maps the playground's divider percentages onto terminal cells:
//!
//! ```text
//! ┌ HTML ─────┐│┌ CSS ──┐│┌ JS ─────┐
//! │           │││       │││         │
//! └───────────┘│└───────┘│└─────────┘
//! ──────────────────────────────────── <- vertical divider row
//! ┌ Preview ─────────────────────────┐
//! └──────────────────────────────────┘
//!  status bar
//! ```
//!
//! Dividers are one cell thick. A divider sits at
//! `container_start + round(extent * percent / 100)`, which is exactly
//! where a pointer converted back to a percentage lands.

use playground::{Divider, Extent, LayoutState, PointerPosition};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Widget,
};

/// Rows reserved for the status bar
pub const STATUS_BAR_HEIGHT: u16 = 1;

/// Offset of a divider along an axis of `len` cells, always inside the axis
fn cells(len: u16, percent: f64) -> u16 {
    let offset = (f64::from(len) * percent / 100.0).round();
    (offset.max(0.0) as u16).min(len.saturating_sub(1))
}

/// The computed layout areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedLayout {
    /// Everything above the status bar; pointer coordinates are relative to it
    pub container: Rect,
    /// The three editor panels, left to right
    pub editors: [Rect; 3],
    /// Columns of the two dividers between editors
    pub column_dividers: [u16; 2],
    /// Row of the divider between editors and preview
    pub row_divider: u16,
    /// Area for the preview pane
    pub preview: Rect,
    /// Area for the status bar
    pub status: Rect,
}

impl ComputedLayout {
    /// Compute the layout for a given terminal area
    pub fn compute(area: Rect, state: &LayoutState) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(STATUS_BAR_HEIGHT)])
            .split(area);
        let container = chunks[0];
        let status = chunks[1];

        let row_divider = container.y + cells(container.height, state.vertical);
        let editors_height = row_divider - container.y;
        let preview_y = (row_divider + 1).min(container.bottom());
        let preview = Rect::new(
            container.x,
            preview_y,
            container.width,
            container.bottom() - preview_y,
        );

        let width = container.width;
        let first = cells(width, state.horizontal[0]);
        let second = cells(width, state.horizontal[1])
            .max(first + 1)
            .min(width.saturating_sub(1).max(first));
        let column = |start: u16, end: u16| {
            Rect::new(
                container.x + start,
                container.y,
                end.saturating_sub(start),
                editors_height,
            )
        };
        let editors = [
            column(0, first),
            column(first + 1, second),
            column(second + 1, width),
        ];

        Self {
            container,
            editors,
            column_dividers: [container.x + first, container.x + second],
            row_divider,
            preview,
            status,
        }
    }

    /// The divider under a terminal cell, if any
    pub fn hit_divider(&self, column: u16, row: u16) -> Option<Divider> {
        let in_container = column >= self.container.x && column < self.container.right();
        if !in_container || self.container.height == 0 {
            return None;
        }
        if row == self.row_divider {
            return Some(Divider::Vertical);
        }
        if row >= self.container.y && row < self.row_divider {
            return self
                .column_dividers
                .iter()
                .position(|&x| x == column)
                .map(Divider::Horizontal);
        }
        None
    }

    /// Index of the editor panel containing a terminal cell
    pub fn editor_at(&self, column: u16, row: u16) -> Option<usize> {
        self.editors
            .iter()
            .position(|area| area.contains((column, row).into()))
    }

    /// Pointer position relative to the container
    pub fn pointer(&self, column: u16, row: u16) -> PointerPosition {
        PointerPosition {
            x: f64::from(column) - f64::from(self.container.x),
            y: f64::from(row) - f64::from(self.container.y),
        }
    }

    /// Size of the container in cells
    pub fn extent(&self) -> Extent {
        Extent {
            width: f64::from(self.container.width),
            height: f64::from(self.container.height),
        }
    }

    /// Inner height of an editor panel (inside its border)
    pub fn editor_rows(&self, index: usize) -> usize {
        self.editors
            .get(index)
            .map_or(0, |area| area.height.saturating_sub(2) as usize)
    }
}

/// Draws the one-cell dividers, highlighting the one being dragged
pub struct Dividers<'a> {
    layout: &'a ComputedLayout,
    active: Option<Divider>,
}

impl<'a> Dividers<'a> {
    pub fn new(layout: &'a ComputedLayout) -> Self {
        Self {
            layout,
            active: None,
        }
    }

    pub fn active(mut self, active: Option<Divider>) -> Self {
        self.active = active;
        self
    }

    fn style(&self, divider: Divider) -> Style {
        if self.active == Some(divider) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }
}

impl Widget for &Dividers<'_> {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        let layout = self.layout;
        if layout.container.height == 0 {
            return;
        }

        let style = self.style(Divider::Vertical);
        for x in layout.container.left()..layout.container.right() {
            if let Some(cell) = buf.cell_mut((x, layout.row_divider)) {
                cell.set_symbol("─").set_style(style);
            }
        }

        for (index, &x) in layout.column_dividers.iter().enumerate() {
            let style = self.style(Divider::Horizontal(index));
            for y in layout.container.y..layout.row_divider {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol("│").set_style(style);
                }
            }
        }
    }
}

/// Status bar content
#[derive(Debug, Clone, Default)]
pub struct StatusContent {
    /// Label of the focused panel
    pub focus: String,
    /// Divider positions, already formatted
    pub layout: String,
    /// Saved / unsaved indicator
    pub save_state: String,
    /// Any additional status message
    pub message: Option<String>,
}

impl StatusContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(mut self, label: impl Into<String>) -> Self {
        self.focus = label.into();
        self
    }

    /// Describe the divider positions
    pub fn layout(mut self, state: &LayoutState) -> Self {
        self.layout = format!(
            "{:.0}% | {:.0}/{:.0}",
            state.vertical, state.horizontal[0], state.horizontal[1]
        );
        self
    }

    pub fn save_state(mut self, state: impl Into<String>) -> Self {
        self.save_state = state.into();
        self
    }

    pub fn message(mut self, msg: Option<impl Into<String>>) -> Self {
        self.message = msg.map(Into::into);
        self
    }

    /// Format for display
    pub fn format(&self, width: u16) -> String {
        let left = format!(" {} | {} ", self.focus, self.layout);
        let middle = self.message.clone().unwrap_or_default();
        let right = format!(" {} | F1-F3 focus  Alt+arrows resize  Ctrl+Q quit ", self.save_state);

        let padding_needed = (width as usize)
            .saturating_sub(left.chars().count())
            .saturating_sub(middle.chars().count())
            .saturating_sub(right.chars().count());

        let left_pad = padding_needed / 2;
        let right_pad = padding_needed - left_pad;

        format!(
            "{}{}{}{}{}",
            left,
            " ".repeat(left_pad),
            middle,
            " ".repeat(right_pad),
            right
        )
    }
}
