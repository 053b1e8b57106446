//! Layout engine
//!
//! The playground is split by three draggable dividers, all kept as
//! percentages of the container so the layout survives window resizes:
//! - one vertical split between the editors (top) and the preview (bottom)
//! - two horizontal splits dividing the editors into three columns
//!
//! Every divider keeps a 10-point margin from the container edges and from
//! its neighbour, so no pane can collapse to nothing or swap places.
//!
//! A drag is a session: `begin_drag` acquires a pointer capture so releases
//! anywhere still reach the engine, and the capture is released when the
//! session ends or is dropped.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Minimum distance (in percentage points) between a divider and an edge or neighbour.
pub const MIN_MARGIN: f64 = 10.0;

/// Vertical split on first run.
pub const DEFAULT_VERTICAL: f64 = 50.0;

/// Horizontal splits on first run.
pub const DEFAULT_HORIZONTAL: [f64; 2] = [33.0, 66.0];

/// Clamp without `f64::clamp`, which panics when `lo > hi`.
///
/// The upper bound wins when the bounds cross.
fn bound(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// A draggable boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Divider {
    /// The split between editors and preview
    Vertical,
    /// One of the two splits between editor columns (index 0 or 1)
    Horizontal(usize),
}

impl Divider {
    /// Build a divider from a kind name and index, as pointer handlers report them.
    pub fn from_parts(kind: &str, index: usize) -> Option<Self> {
        match (kind, index) {
            ("vertical", _) => Some(Divider::Vertical),
            ("horizontal", 0 | 1) => Some(Divider::Horizontal(index)),
            _ => None,
        }
    }
}

/// Divider positions in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutState {
    /// Height of the editor row as a percentage of the container
    pub vertical: f64,
    /// Left edges of the second and third editor columns
    pub horizontal: [f64; 2],
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            vertical: DEFAULT_VERTICAL,
            horizontal: DEFAULT_HORIZONTAL,
        }
    }
}

impl LayoutState {
    /// Build a state from untrusted values (e.g. read back from storage).
    ///
    /// Non-finite values fall back to the defaults; everything else is
    /// clamped until the margin rules hold.
    pub fn restored(vertical: f64, horizontal: [f64; 2]) -> Self {
        let vertical = if vertical.is_finite() {
            bound(vertical, MIN_MARGIN, 100.0 - MIN_MARGIN)
        } else {
            DEFAULT_VERTICAL
        };

        let horizontal = if horizontal.iter().all(|v| v.is_finite()) {
            let first = bound(horizontal[0], MIN_MARGIN, 100.0 - 2.0 * MIN_MARGIN);
            let second = bound(horizontal[1], first + MIN_MARGIN, 100.0 - MIN_MARGIN);
            [first, second]
        } else {
            DEFAULT_HORIZONTAL
        };

        Self {
            vertical,
            horizontal,
        }
    }

    /// Whether every margin rule holds.
    pub fn is_valid(&self) -> bool {
        let [first, second] = self.horizontal;
        (MIN_MARGIN..=100.0 - MIN_MARGIN).contains(&self.vertical)
            && first >= MIN_MARGIN
            && second >= first + MIN_MARGIN
            && second <= 100.0 - MIN_MARGIN
    }

    /// Move the vertical split, clamped to `[10, 90]`.
    pub fn set_vertical(&mut self, percent: f64) {
        self.vertical = bound(percent, MIN_MARGIN, 100.0 - MIN_MARGIN);
    }

    /// Move horizontal split `index`, clamped against the edges and the other split.
    ///
    /// Split 0 stays within `[10, split1 - 10]`, split 1 within `[split0 + 10, 90]`.
    pub fn set_horizontal(&mut self, index: usize, percent: f64) {
        let [first, second] = self.horizontal;
        match index {
            0 => self.horizontal[0] = bound(percent, MIN_MARGIN, second - MIN_MARGIN),
            1 => self.horizontal[1] = bound(percent, first + MIN_MARGIN, 100.0 - MIN_MARGIN),
            _ => {}
        }
    }

    /// Move `divider` to `percent` under its clamp rule.
    pub fn set(&mut self, divider: Divider, percent: f64) {
        match divider {
            Divider::Vertical => self.set_vertical(percent),
            Divider::Horizontal(index) => self.set_horizontal(index, percent),
        }
    }

    /// Current position of `divider`.
    pub fn position(&self, divider: Divider) -> f64 {
        match divider {
            Divider::Vertical => self.vertical,
            Divider::Horizontal(index) => self.horizontal.get(index).copied().unwrap_or(0.0),
        }
    }

    /// Widths of the three editor columns in percent.
    pub fn column_widths(&self) -> [f64; 3] {
        let [first, second] = self.horizontal;
        [first, second - first, 100.0 - second]
    }
}

/// Tracks whether some drag currently owns the pointer.
///
/// Clones share the same count. Hosts ask `is_captured` to decide whether
/// pointer moves and releases must be routed to the layout engine no
/// matter where they happen.
#[derive(Debug, Clone, Default)]
pub struct PointerCapture {
    active: Rc<Cell<usize>>,
}

impl PointerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pointer until the returned guard is dropped.
    pub fn acquire(&self) -> CaptureGuard {
        self.active.set(self.active.get() + 1);
        CaptureGuard {
            active: Rc::clone(&self.active),
        }
    }

    pub fn is_captured(&self) -> bool {
        self.active.get() > 0
    }
}

/// Releases its pointer capture when dropped.
#[derive(Debug)]
pub struct CaptureGuard {
    active: Rc<Cell<usize>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.active.set(self.active.get().saturating_sub(1));
    }
}

/// An active drag: which divider, plus the capture it holds.
#[derive(Debug)]
struct DragSession {
    divider: Divider,
    _capture: CaptureGuard,
}

/// Size of the container the pointer moves over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

/// Pointer position relative to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

/// Divider state plus the drag session that moves it.
#[derive(Debug)]
pub struct LayoutEngine {
    state: LayoutState,
    drag: Option<DragSession>,
    capture: PointerCapture,
}

impl LayoutEngine {
    pub fn new(state: LayoutState, capture: PointerCapture) -> Self {
        Self {
            state,
            drag: None,
            capture,
        }
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn capture(&self) -> &PointerCapture {
        &self.capture
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The divider being dragged, if any.
    pub fn active_divider(&self) -> Option<Divider> {
        self.drag.as_ref().map(|d| d.divider)
    }

    /// Start dragging `divider`. A drag already in progress is replaced.
    ///
    /// Horizontal indices other than 0 and 1 are ignored.
    pub fn begin_drag(&mut self, divider: Divider) {
        if let Divider::Horizontal(index) = divider
            && index > 1
        {
            debug!("Ignoring drag on unknown divider {:?}", divider);
            return;
        }

        // Release the previous capture before taking a new one
        self.drag = None;
        self.drag = Some(DragSession {
            divider,
            _capture: self.capture.acquire(),
        });
        debug!("Drag started on {:?}", divider);
    }

    /// Move the active divider to follow the pointer.
    ///
    /// Returns whether the layout changed. Does nothing without an active
    /// drag or when the container has no size along the drag axis.
    pub fn update_drag(&mut self, pointer: PointerPosition, container: Extent) -> bool {
        let Some(divider) = self.active_divider() else {
            return false;
        };

        let (offset, extent) = match divider {
            Divider::Vertical => (pointer.y, container.height),
            Divider::Horizontal(_) => (pointer.x, container.width),
        };
        if extent.is_nan() || extent <= 0.0 || !offset.is_finite() {
            return false;
        }

        let percent = offset / extent * 100.0;
        let before = self.state;
        self.state.set(divider, percent);
        trace!("Drag {:?} to {:.2}%", divider, self.state.position(divider));
        self.state != before
    }

    /// Finish the drag and release the pointer. Safe to call at any time.
    ///
    /// Returns whether a drag was actually active.
    pub fn end_drag(&mut self) -> bool {
        match self.drag.take() {
            Some(session) => {
                debug!("Drag ended on {:?}", session.divider);
                true
            }
            None => false,
        }
    }

    /// Shift `divider` by `delta` points under the usual clamp rule.
    pub fn nudge(&mut self, divider: Divider, delta: f64) -> bool {
        let before = self.state;
        let target = self.state.position(divider) + delta;
        self.state.set(divider, target);
        self.state != before
    }

    /// Put every divider back to its first-run position.
    pub fn reset(&mut self) -> bool {
        let before = self.state;
        self.state = LayoutState::default();
        self.state != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: Extent = Extent {
        width: 200.0,
        height: 50.0,
    };

    fn engine() -> LayoutEngine {
        LayoutEngine::new(LayoutState::default(), PointerCapture::new())
    }

    fn at(x: f64, y: f64) -> PointerPosition {
        PointerPosition { x, y }
    }

    #[test]
    fn test_defaults() {
        let state = LayoutState::default();
        assert_eq!(state.vertical, 50.0);
        assert_eq!(state.horizontal, [33.0, 66.0]);
        assert!(state.is_valid());
    }

    #[test]
    fn test_vertical_drag_is_clamped() {
        let mut engine = engine();
        engine.begin_drag(Divider::Vertical);

        for y in [-30.0, 0.0, 2.0, 12.5, 25.0, 48.0, 50.0, 75.0] {
            engine.update_drag(at(0.0, y), CONTAINER);
            let v = engine.state().vertical;
            assert!((10.0..=90.0).contains(&v), "y={} gave {}", y, v);
        }

        engine.update_drag(at(0.0, 12.5), CONTAINER);
        assert_eq!(engine.state().vertical, 25.0);
    }

    #[test]
    fn test_horizontal_drags_keep_margin() {
        let mut engine = engine();
        for x in (-20..=220).step_by(7) {
            engine.begin_drag(Divider::Horizontal(0));
            engine.update_drag(at(x as f64, 0.0), CONTAINER);
            let [first, second] = engine.state().horizontal;
            assert!(first >= 10.0);
            assert!(first <= second - 10.0);

            engine.begin_drag(Divider::Horizontal(1));
            engine.update_drag(at((220 - x) as f64, 0.0), CONTAINER);
            let [first, second] = engine.state().horizontal;
            assert!(second >= first + 10.0);
            assert!(second <= 90.0);
        }
        engine.end_drag();
    }

    #[test]
    fn test_first_divider_stops_before_second() {
        let mut engine = engine();
        engine.begin_drag(Divider::Horizontal(0));
        engine.update_drag(at(190.0, 0.0), CONTAINER);
        assert_eq!(engine.state().horizontal, [56.0, 66.0]);
    }

    #[test]
    fn test_second_divider_stops_after_first() {
        let mut engine = engine();
        engine.begin_drag(Divider::Horizontal(1));
        engine.update_drag(at(0.0, 0.0), CONTAINER);
        assert_eq!(engine.state().horizontal, [33.0, 43.0]);
    }

    #[test]
    fn test_update_without_drag_is_noop() {
        let mut engine = engine();
        assert!(!engine.update_drag(at(10.0, 10.0), CONTAINER));
        assert_eq!(*engine.state(), LayoutState::default());
    }

    #[test]
    fn test_zero_sized_container_is_ignored() {
        let mut engine = engine();
        engine.begin_drag(Divider::Vertical);
        let flat = Extent {
            width: 100.0,
            height: 0.0,
        };
        assert!(!engine.update_drag(at(0.0, 5.0), flat));
        assert_eq!(engine.state().vertical, 50.0);
    }

    #[test]
    fn test_end_drag_is_idempotent() {
        let mut engine = engine();
        engine.begin_drag(Divider::Vertical);
        engine.update_drag(at(0.0, 40.0), CONTAINER);
        let state = *engine.state();

        assert!(engine.end_drag());
        assert!(!engine.end_drag());
        assert_eq!(*engine.state(), state);
        assert!(!engine.is_dragging());
    }

    #[test]
    fn test_capture_follows_drag_session() {
        let capture = PointerCapture::new();
        let mut engine = LayoutEngine::new(LayoutState::default(), capture.clone());
        assert!(!capture.is_captured());

        engine.begin_drag(Divider::Horizontal(1));
        assert!(capture.is_captured());

        // Switching divider mid-drag must not leak the first capture
        engine.begin_drag(Divider::Vertical);
        engine.end_drag();
        assert!(!capture.is_captured());
    }

    #[test]
    fn test_capture_released_when_engine_dropped() {
        let capture = PointerCapture::new();
        {
            let mut engine = LayoutEngine::new(LayoutState::default(), capture.clone());
            engine.begin_drag(Divider::Vertical);
            assert!(capture.is_captured());
        }
        assert!(!capture.is_captured());
    }

    #[test]
    fn test_unknown_horizontal_index_is_ignored() {
        let mut engine = engine();
        engine.begin_drag(Divider::Horizontal(2));
        assert!(!engine.is_dragging());
        assert_eq!(Divider::from_parts("horizontal", 2), None);
        assert_eq!(
            Divider::from_parts("horizontal", 1),
            Some(Divider::Horizontal(1))
        );
        assert_eq!(Divider::from_parts("vertical", 0), Some(Divider::Vertical));
    }

    #[test]
    fn test_restored_repairs_bad_values() {
        let state = LayoutState::restored(f64::NAN, [80.0, 20.0]);
        assert_eq!(state.vertical, 50.0);
        assert_eq!(state.horizontal, [80.0, 90.0]);
        assert!(state.is_valid());

        let state = LayoutState::restored(120.0, [f64::INFINITY, 50.0]);
        assert_eq!(state.vertical, 90.0);
        assert_eq!(state.horizontal, [33.0, 66.0]);

        let state = LayoutState::restored(40.0, [2.0, 11.0]);
        assert_eq!(state.horizontal, [10.0, 20.0]);
        assert!(state.is_valid());
    }

    #[test]
    fn test_nudge_and_reset() {
        let mut engine = engine();
        assert!(engine.nudge(Divider::Vertical, 5.0));
        assert_eq!(engine.state().vertical, 55.0);

        assert!(engine.nudge(Divider::Horizontal(1), 100.0));
        assert_eq!(engine.state().horizontal[1], 90.0);
        assert!(!engine.nudge(Divider::Horizontal(1), 1.0));

        assert!(engine.reset());
        assert_eq!(*engine.state(), LayoutState::default());
        assert!(!engine.reset());
    }

    #[test]
    fn test_column_widths_sum_to_hundred() {
        let widths = LayoutState::default().column_widths();
        assert_eq!(widths.iter().sum::<f64>(), 100.0);
        assert_eq!(widths, [33.0, 33.0, 34.0]);
    }
}
