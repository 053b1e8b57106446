//! Application State
//!
//! Owns the playground, one editing core per panel and the rendering
//! surface. Events come in with the time they were read so that debounced
//! work can be driven (and tested) without sleeping.

use crate::keys::convert_key;
use crate::ui::editor_pane::EditorPane;
use crate::ui::layout::{ComputedLayout, Dividers, StatusContent};
use crate::ui::preview_pane::PreviewPane;
use code_edit::{CodeEditor, TextEditor};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use playground::preview::text_outline;
use playground::{
    Divider, Language, Playground, PlaygroundConfig, PointerCapture, RenderSurface, Storage,
    TickOutcome,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Longest the event loop waits for input between ticks
pub const MAX_POLL: Duration = Duration::from_millis(100);

/// Application state
pub struct App {
    playground: Playground<Box<dyn Storage>>,
    surface: Box<dyn RenderSurface>,
    /// Path of the sandboxed page, shown under the preview
    page_path: Option<PathBuf>,
    editors: [CodeEditor; 3],
    focus: Language,
    /// Text outline of the last rendered document
    preview_lines: Vec<String>,
    /// Terminal area of the last frame
    viewport: Rect,
    resize_step: f64,
    status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    /// Open the playground over `storage`, presenting previews to `surface`
    pub fn new(
        storage: Box<dyn Storage>,
        surface: Box<dyn RenderSurface>,
        config: &PlaygroundConfig,
        now: Instant,
    ) -> Self {
        let playground = Playground::open(storage, config, PointerCapture::new(), now);
        Self {
            playground,
            surface,
            page_path: None,
            editors: std::array::from_fn(|_| CodeEditor::new()),
            focus: Language::Html,
            preview_lines: Vec::new(),
            viewport: Rect::default(),
            resize_step: config.resize_step,
            status_message: None,
            should_quit: false,
        }
    }

    /// Show where the sandboxed page lives
    pub fn with_page_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.page_path = Some(path.into());
        self
    }

    pub fn focus(&self) -> Language {
        self.focus
    }

    pub fn buffer(&self, language: Language) -> &str {
        self.playground.buffer(language)
    }

    pub fn playground(&self) -> &Playground<Box<dyn Storage>> {
        &self.playground
    }

    pub fn preview_lines(&self) -> &[String] {
        &self.preview_lines
    }

    pub fn page_path(&self) -> Option<&Path> {
        self.page_path.as_deref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Record the terminal size (also refreshed on every render)
    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
    }

    fn layout(&self) -> ComputedLayout {
        ComputedLayout::compute(self.viewport, self.playground.layout())
    }

    /// How long the event loop may wait before the next debounced task is due
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.playground
            .next_deadline()
            .map_or(MAX_POLL, |deadline| {
                deadline.saturating_duration_since(now).min(MAX_POLL)
            })
    }

    /// Handle any terminal event
    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Paste(text) => self.paste(&text, now),
            Event::Resize(width, height) => self.viewport = Rect::new(0, 0, width, height),
            // The pointer can't be followed outside the window
            Event::FocusLost => {
                self.playground.end_drag();
            }
            _ => {}
        }
    }

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        // Clear status message on any key
        self.status_message = None;

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let step = self.resize_step;

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
            }
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('r') if ctrl => {
                self.playground.reset_layout();
                self.status_message = Some("Layout reset".to_string());
            }
            KeyCode::F(n @ 1..=3) => self.focus = Language::ALL[usize::from(n) - 1],
            KeyCode::Left if ctrl => self.focus = self.focus.prev(),
            KeyCode::Right if ctrl => self.focus = self.focus.next(),
            KeyCode::Up if alt => {
                self.playground.nudge(Divider::Vertical, -step, now);
            }
            KeyCode::Down if alt => {
                self.playground.nudge(Divider::Vertical, step, now);
            }
            KeyCode::Left if alt => {
                self.playground.nudge(self.focused_divider(), -step, now);
            }
            KeyCode::Right if alt => {
                self.playground.nudge(self.focused_divider(), step, now);
            }
            _ => self.edit_focused(key, now),
        }
    }

    /// The column divider keyboard resizing moves for the focused panel
    fn focused_divider(&self) -> Divider {
        match self.focus {
            Language::Html => Divider::Horizontal(0),
            Language::Css | Language::Javascript => Divider::Horizontal(1),
        }
    }

    /// Pass a key to the focused panel's editor and apply its edits
    fn edit_focused(&mut self, key: KeyEvent, now: Instant) {
        let Some(key) = convert_key(key) else {
            return;
        };
        let language = self.focus;
        let rows = self.layout().editor_rows(language.index()).max(1);

        let editor = &mut self.editors[language.index()];
        editor.set_page_lines(rows);
        let result = editor.handle_key(key, self.playground.buffer(language));

        if result.changes_text() {
            self.playground
                .update_buffer(language, now, |text| result.apply_to(text));
        }
    }

    /// Insert pasted text into the focused panel without re-indenting it
    fn paste(&mut self, pasted: &str, now: Instant) {
        self.status_message = None;
        let language = self.focus;
        let editor = &mut self.editors[language.index()];
        let result = editor.paste(pasted, self.playground.buffer(language));

        if result.changes_text() {
            self.playground
                .update_buffer(language, now, |text| result.apply_to(text));
        }
    }

    /// Whether a divider drag currently owns the pointer
    pub fn pointer_captured(&self) -> bool {
        self.playground.layout_engine().capture().is_captured()
    }

    /// Handle a mouse event
    ///
    /// A press on a divider starts a drag and captures the pointer. While
    /// captured, moves and the release are taken wherever they happen;
    /// otherwise they are ignored.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let layout = self.layout();
        let captured = self.pointer_captured();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(divider) = layout.hit_divider(mouse.column, mouse.row) {
                    self.playground.begin_drag(divider);
                } else if let Some(index) = layout.editor_at(mouse.column, mouse.row) {
                    self.focus = Language::ALL[index];
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if captured => {
                let pointer = layout.pointer(mouse.column, mouse.row);
                self.playground.update_drag(pointer, layout.extent(), now);
            }
            MouseEventKind::Up(MouseButton::Left) if captured => {
                self.playground.end_drag();
            }
            _ => {}
        }
    }

    /// Run whatever debounced work is due
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.playground.tick(now, self.surface.as_mut());
        if outcome.rendered {
            self.preview_lines = text_outline(self.playground.document());
            debug!("Preview shows {} lines", self.preview_lines.len());
        }
        outcome
    }

    /// Write pending changes now
    fn save(&mut self) {
        self.status_message = Some(match self.playground.flush() {
            Ok(()) => "Saved".to_string(),
            Err(e) => format!("Save failed: {}", e),
        });
    }

    /// Save pending changes and drop the pending preview
    pub fn shutdown(&mut self) -> Result<(), String> {
        info!("Shutting down");
        self.playground
            .shutdown()
            .map_err(|e| format!("Failed to save on exit: {}", e))
    }

    /// Render the application to a frame
    pub fn render(&mut self, frame: &mut Frame) {
        self.viewport = frame.area();
        let layout = self.layout();

        for (index, language) in Language::ALL.into_iter().enumerate() {
            let pane = EditorPane::new(
                language,
                self.playground.buffer(language),
                self.editors[index].cursor(),
            )
            .focused(language == self.focus);
            frame.render_widget(&pane, layout.editors[index]);
        }

        let preview = PreviewPane::new(&self.preview_lines)
            .page(self.page_path.as_deref())
            .hidden(self.playground.is_dragging());
        frame.render_widget(&preview, layout.preview);

        let dividers =
            Dividers::new(&layout).active(self.playground.layout_engine().active_divider());
        frame.render_widget(&dividers, layout.container);

        self.render_status_bar(frame, layout.status);
    }

    /// Render the status bar
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let message = self
            .status_message
            .as_deref()
            .or_else(|| self.playground.last_error());
        let save_state = if self.playground.has_unsaved_changes() {
            "unsaved"
        } else {
            "saved"
        };
        let status = StatusContent::new()
            .focus(self.focus.label())
            .layout(self.playground.layout())
            .save_state(save_state)
            .message(message);

        let style = Style::default().bg(Color::DarkGray).fg(Color::White);
        let paragraph = Paragraph::new(Line::from(Span::styled(status.format(area.width), style)));
        frame.render_widget(paragraph, area);
    }
}
