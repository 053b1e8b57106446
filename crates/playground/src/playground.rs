//! Root playground state
//!
//! Owns the buffers, the layout engine and both debouncers. Hosts feed it
//! edits, pointer events and the current time; `tick` writes what is due
//! and hands regenerated documents to a rendering surface.

use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::buffers::{Buffers, Language};
use crate::config::PlaygroundConfig;
use crate::debounce::Debouncer;
use crate::layout::{
    DEFAULT_HORIZONTAL, DEFAULT_VERTICAL, Divider, Extent, LayoutEngine, LayoutState,
    PointerCapture, PointerPosition,
};
use crate::preview::{Compositor, RenderSurface};
use crate::store::{PersistentStore, Storage, StoreError};

/// Storage key of the vertical split.
pub const KEY_VERTICAL: &str = "verticalDivider";

/// Storage key of the horizontal split pair.
pub const KEY_HORIZONTAL: &str = "horizontalDividers";

/// Something waiting to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Entry {
    Buffer(Language),
    Layout,
}

/// What a call to [`Playground::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Pending changes were written to storage
    pub flushed: bool,
    /// A new preview document was built and presented
    pub rendered: bool,
}

pub struct Playground<S: Storage> {
    store: PersistentStore<S>,
    buffers: Buffers,
    layout: LayoutEngine,
    persist: Debouncer<BTreeSet<Entry>>,
    compositor: Compositor,
    /// Last failed storage write, cleared by the next successful one
    store_error: Option<String>,
    /// Last failed preview presentation, cleared by the next success
    surface_error: Option<String>,
}

impl<S: Storage> Playground<S> {
    /// Restore buffers and layout from `storage` and schedule the first preview.
    pub fn open(
        storage: S,
        config: &PlaygroundConfig,
        capture: PointerCapture,
        now: Instant,
    ) -> Self {
        let store = PersistentStore::with_prefix(storage, config.storage_prefix.clone());

        let mut buffers = Buffers::default();
        for language in Language::ALL {
            buffers.set(language, Some(store.get(language.store_key(), String::new())));
        }

        let stored = (
            store.get(KEY_VERTICAL, DEFAULT_VERTICAL),
            store.get(KEY_HORIZONTAL, DEFAULT_HORIZONTAL),
        );
        let state = LayoutState::restored(stored.0, stored.1);
        if (state.vertical, state.horizontal) != stored {
            warn!(
                "Stored layout {:?} adjusted to {:?}",
                stored,
                (state.vertical, state.horizontal)
            );
        }

        let mut compositor = Compositor::new(config.preview_debounce());
        compositor.schedule(now);

        info!(
            "Playground opened: {} / {} / {} bytes of html / css / js",
            buffers.html.len(),
            buffers.css.len(),
            buffers.js.len()
        );

        Self {
            store,
            buffers,
            layout: LayoutEngine::new(state, capture),
            persist: Debouncer::new(config.persist_debounce()),
            compositor,
            store_error: None,
            surface_error: None,
        }
    }

    pub fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    pub fn buffer(&self, language: Language) -> &str {
        self.buffers.get(language)
    }

    pub fn layout(&self) -> &LayoutState {
        self.layout.state()
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn is_dragging(&self) -> bool {
        self.layout.is_dragging()
    }

    /// Replace a buffer with content coming from its editor panel.
    ///
    /// Returns whether the buffer changed.
    pub fn edit(&mut self, language: Language, content: Option<String>, now: Instant) -> bool {
        self.update_buffer(language, now, |text| {
            let content = content.unwrap_or_default();
            if *text == content {
                return false;
            }
            *text = content;
            true
        })
    }

    /// Change a buffer in place. `f` reports whether it changed anything.
    pub fn update_buffer<F>(&mut self, language: Language, now: Instant, f: F) -> bool
    where
        F: FnOnce(&mut String) -> bool,
    {
        if !f(self.buffers.get_mut(language)) {
            return false;
        }
        self.mark_dirty(Entry::Buffer(language), now);
        self.compositor.schedule(now);
        true
    }

    pub fn begin_drag(&mut self, divider: Divider) {
        self.layout.begin_drag(divider);
    }

    /// Follow the pointer with the active divider.
    pub fn update_drag(
        &mut self,
        pointer: PointerPosition,
        container: Extent,
        now: Instant,
    ) -> bool {
        let changed = self.layout.update_drag(pointer, container);
        if changed {
            self.mark_dirty(Entry::Layout, now);
        }
        changed
    }

    pub fn end_drag(&mut self) -> bool {
        self.layout.end_drag()
    }

    /// Move a divider by `delta` percentage points.
    pub fn nudge(&mut self, divider: Divider, delta: f64, now: Instant) -> bool {
        let changed = self.layout.nudge(divider, delta);
        if changed {
            self.mark_dirty(Entry::Layout, now);
        }
        changed
    }

    /// Restore the first-run layout and forget the stored one.
    pub fn reset_layout(&mut self) -> bool {
        self.layout.end_drag();
        let changed = self.layout.reset();

        // Pending buffer writes keep their deadline
        self.persist.amend(|dirty| {
            dirty.remove(&Entry::Layout);
            !dirty.is_empty()
        });
        let removed = self
            .store
            .remove(KEY_VERTICAL)
            .and_then(|()| self.store.remove(KEY_HORIZONTAL));
        match removed {
            Ok(()) => self.store_error = None,
            Err(e) => self.record_error(&e),
        }
        changed
    }

    /// The earliest moment `tick` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.persist.deadline(), self.compositor.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run whatever debounced work is due at `now`.
    pub fn tick(&mut self, now: Instant, surface: &mut dyn RenderSurface) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if let Some(dirty) = self.persist.poll(now) {
            // Failures are recorded by write_entries
            let _ = self.write_entries(dirty);
            outcome.flushed = true;
        }

        if let Some(document) = self.compositor.poll(now, &self.buffers) {
            outcome.rendered = true;
            debug!("Preview rebuilt ({} bytes)", document.len());
            match surface.present(document) {
                Ok(()) => self.surface_error = None,
                Err(e) => {
                    warn!("Preview not presented: {}", e);
                    self.surface_error = Some(e.to_string());
                }
            }
        }

        outcome
    }

    /// Write pending changes now instead of waiting for the quiet period.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        match self.persist.flush() {
            Some(dirty) => self.write_entries(dirty),
            None => Ok(()),
        }
    }

    /// Save pending changes and drop the pending preview.
    pub fn shutdown(&mut self) -> Result<(), StoreError> {
        self.layout.end_drag();
        let saved = self.flush();
        if self.compositor.cancel() {
            debug!("Dropped pending preview on shutdown");
        }
        saved
    }

    /// Drop both pending tasks without running them.
    pub fn cancel_pending(&mut self) {
        self.persist.cancel();
        self.compositor.cancel();
    }

    /// The last preview document built (empty before the first build).
    pub fn document(&self) -> &str {
        self.compositor.document()
    }

    /// Whether a store write is waiting for its quiet period.
    pub fn has_unsaved_changes(&self) -> bool {
        self.persist.is_pending()
    }

    pub fn store(&self) -> &PersistentStore<S> {
        &self.store
    }

    /// Message of the most recent storage or surface failure.
    pub fn last_error(&self) -> Option<&str> {
        self.store_error
            .as_deref()
            .or(self.surface_error.as_deref())
    }

    pub fn clear_error(&mut self) {
        self.store_error = None;
        self.surface_error = None;
    }

    fn mark_dirty(&mut self, entry: Entry, now: Instant) {
        self.persist.update(now, |dirty| {
            dirty.insert(entry);
        });
    }

    /// Write every entry, continuing past failures. Returns the first failure.
    fn write_entries(&mut self, dirty: BTreeSet<Entry>) -> Result<(), StoreError> {
        let mut first_error = None;
        for entry in dirty {
            if let Err(e) = self.write_entry(entry) {
                self.record_error(&e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                self.store_error = None;
                Ok(())
            }
        }
    }

    fn write_entry(&mut self, entry: Entry) -> Result<(), StoreError> {
        debug!("Saving {:?}", entry);
        match entry {
            Entry::Buffer(language) => self
                .store
                .set(language.store_key(), self.buffers.get(language)),
            Entry::Layout => {
                let state = *self.layout.state();
                self.store.set(KEY_VERTICAL, &state.vertical)?;
                self.store.set(KEY_HORIZONTAL, &state.horizontal)
            }
        }
    }

    fn record_error(&mut self, error: &StoreError) {
        warn!("Storage write failed: {}", error);
        self.store_error = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::{MemorySurface, compose_document};
    use crate::store::MemoryStorage;
    use std::time::Duration;

    const PERSIST: Duration = Duration::from_millis(500);
    const PREVIEW: Duration = Duration::from_millis(250);

    fn open(storage: MemoryStorage, now: Instant) -> Playground<MemoryStorage> {
        Playground::open(
            storage,
            &PlaygroundConfig::default(),
            PointerCapture::new(),
            now,
        )
    }

    #[test]
    fn test_first_run_defaults() {
        let playground = open(MemoryStorage::new(), Instant::now());
        assert_eq!(playground.layout(), &LayoutState::default());
        assert_eq!(playground.buffers(), &Buffers::default());
        assert!(playground.last_error().is_none());
    }

    #[test]
    fn test_restores_stored_state() {
        let mut storage = MemoryStorage::new();
        storage.set_item("codepencilcss", "\"p { margin: 0 }\"").unwrap();
        storage.set_item("codepencilverticalDivider", "70").unwrap();
        storage
            .set_item("codepencilhorizontalDividers", "[20,40]")
            .unwrap();

        let playground = open(storage, Instant::now());
        assert_eq!(playground.buffer(Language::Css), "p { margin: 0 }");
        assert_eq!(playground.layout().vertical, 70.0);
        assert_eq!(playground.layout().horizontal, [20.0, 40.0]);
    }

    #[test]
    fn test_invalid_stored_layout_is_clamped() {
        let mut storage = MemoryStorage::new();
        storage.set_item("codepencilverticalDivider", "99").unwrap();
        storage
            .set_item("codepencilhorizontalDividers", "[60,55]")
            .unwrap();

        let playground = open(storage, Instant::now());
        assert!(playground.layout().is_valid());
        assert_eq!(playground.layout().vertical, 90.0);
    }

    #[test]
    fn test_first_preview_after_quiet_period() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        let mut surface = MemorySurface::new();

        assert_eq!(playground.next_deadline(), Some(start + PREVIEW));
        let outcome = playground.tick(start + PREVIEW, &mut surface);
        assert!(outcome.rendered);
        assert!(!outcome.flushed);
        assert_eq!(surface.last(), Some(compose_document(&Buffers::default()).as_str()));
    }

    #[test]
    fn test_edits_coalesce_into_one_write_and_one_render() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        let mut surface = MemorySurface::new();

        let mut now = start;
        let mut text = String::new();
        for ch in "<h1>Hi</h1>".chars() {
            now += Duration::from_millis(40);
            text.push(ch);
            assert!(playground.edit(Language::Html, Some(text.clone()), now));
            playground.tick(now, &mut surface);
        }

        assert!(surface.documents.is_empty());
        assert_eq!(playground.store().storage().write_count(), 0);

        let rendered = playground.tick(now + PREVIEW, &mut surface);
        assert!(rendered.rendered);
        let flushed = playground.tick(now + PERSIST, &mut surface);
        assert!(flushed.flushed);

        assert_eq!(surface.documents.len(), 1);
        assert!(surface.documents[0].contains("<body><h1>Hi</h1></body>"));
        assert!(surface.documents[0].contains("<style></style>"));
        assert_eq!(playground.store().storage().write_count(), 1);
        assert_eq!(
            playground.store().get("html", String::new()),
            "<h1>Hi</h1>"
        );
    }

    #[test]
    fn test_unchanged_edit_schedules_nothing() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        assert!(!playground.edit(Language::Css, None, start));
        assert!(!playground.has_unsaved_changes());
    }

    #[test]
    fn test_drag_marks_layout_dirty() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        let container = Extent {
            width: 100.0,
            height: 100.0,
        };

        playground.begin_drag(Divider::Vertical);
        assert!(playground.is_dragging());
        assert!(playground.update_drag(PointerPosition { x: 0.0, y: 5.0 }, container, start));
        assert_eq!(playground.layout().vertical, 10.0);
        assert!(playground.end_drag());
        assert!(!playground.end_drag());

        playground.flush().unwrap();
        assert_eq!(playground.store().get(KEY_VERTICAL, 0.0), 10.0);
        assert_eq!(playground.store().get(KEY_HORIZONTAL, [0.0; 2]), [33.0, 66.0]);
    }

    #[test]
    fn test_reset_layout_forgets_stored_layout() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        playground.nudge(Divider::Horizontal(1), 10.0, start);
        playground.flush().unwrap();
        assert_eq!(playground.store().get(KEY_HORIZONTAL, [0.0; 2]), [33.0, 76.0]);

        playground.nudge(Divider::Vertical, -5.0, start);
        assert!(playground.reset_layout());
        assert_eq!(playground.layout(), &LayoutState::default());
        assert!(playground.store().storage().get_item("codepencilhorizontalDividers").is_none());

        // The pending nudge must not write the old layout back
        playground.flush().unwrap();
        assert!(playground.store().storage().get_item("codepencilverticalDivider").is_none());
    }

    #[test]
    fn test_reset_layout_drops_pending_layout_write() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        let mut surface = MemorySurface::new();

        playground.nudge(Divider::Vertical, 5.0, start);
        playground.reset_layout();
        assert!(!playground.has_unsaved_changes());
        assert!(!playground.tick(start + PERSIST, &mut surface).flushed);
        assert_eq!(playground.store().storage().write_count(), 0);
    }

    #[test]
    fn test_reset_layout_keeps_buffer_deadline() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        let mut surface = MemorySurface::new();
        let later = start + Duration::from_millis(100);

        playground.edit(Language::Html, Some("<p>".to_string()), start);
        playground.nudge(Divider::Vertical, 5.0, later);
        playground.reset_layout();
        assert!(playground.has_unsaved_changes());

        assert!(!playground.tick(start + PERSIST, &mut surface).flushed);
        assert!(playground.tick(later + PERSIST, &mut surface).flushed);
        assert_eq!(playground.store().get("html", String::new()), "<p>");
        assert!(playground.store().storage().get_item("codepencilverticalDivider").is_none());
    }

    #[test]
    fn test_successful_write_clears_earlier_failure() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new().with_quota(40), start);

        playground.edit(Language::Javascript, Some("x".repeat(100)), start);
        assert!(playground.flush().is_err());
        assert!(playground.last_error().is_some());

        playground.edit(Language::Javascript, Some("x".to_string()), start);
        playground.flush().unwrap();
        assert_eq!(playground.last_error(), None);
    }

    #[test]
    fn test_write_failure_is_recorded_and_not_fatal() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new().with_quota(40), start);

        playground.edit(Language::Javascript, Some("x".repeat(100)), start);
        let err = playground.flush().unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert!(playground.last_error().is_some());
        assert_eq!(playground.buffer(Language::Javascript).len(), 100);

        playground.clear_error();
        assert!(playground.last_error().is_none());
    }

    #[test]
    fn test_shutdown_saves_and_drops_preview() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        let mut surface = MemorySurface::new();
        playground.edit(Language::Css, Some("b {}".to_string()), start);

        playground.shutdown().unwrap();
        assert_eq!(playground.store().get("css", String::new()), "b {}");
        assert_eq!(playground.next_deadline(), None);
        assert_eq!(playground.tick(start + PERSIST, &mut surface), TickOutcome::default());
        assert!(surface.documents.is_empty());
    }

    #[test]
    fn test_cancel_pending_drops_both_tasks() {
        let start = Instant::now();
        let mut playground = open(MemoryStorage::new(), start);
        playground.edit(Language::Html, Some("<p>".to_string()), start);
        playground.cancel_pending();

        assert_eq!(playground.next_deadline(), None);
        assert_eq!(playground.store().storage().write_count(), 0);
    }
}
