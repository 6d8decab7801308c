//! Interactive drag-to-resize controller.
//!
//! A resize gesture is a small state machine, `Idle -> Dragging -> Idle`.
//! Entering `Dragging` takes ownership of a [`PointerCapture`]; every exit
//! path (pointer up, pointer cancel, a new gesture replacing the old one, or
//! dropping the controller) releases it exactly once.

use serde::{Deserialize, Serialize};

use crate::grid::{snap_within, DEFAULT_GRID_SIZE};
use crate::types::{Position, Size, MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Edge or corner a resize handle is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    East,
    South,
    Southeast,
}

impl ResizeDirection {
    pub fn resizes_width(self) -> bool {
        matches!(self, Self::East | Self::Southeast)
    }

    pub fn resizes_height(self) -> bool {
        matches!(self, Self::South | Self::Southeast)
    }
}

/// Clamp range and grid used while resizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min: Size,
    pub max: Size,
    pub grid_size: f64,
}

impl Default for ResizeLimits {
    fn default() -> Self {
        Self {
            min: Size::new(MIN_WIDTH, MIN_HEIGHT),
            max: Size::new(MAX_WIDTH, MAX_HEIGHT),
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

impl ResizeLimits {
    pub fn with_grid(grid_size: f64) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }
}

/// Compute the size for a pointer at `pointer` during a gesture.
///
/// Only the axes selected by `direction` change; each changed axis is the
/// start dimension plus the pointer delta, clamped to the limits and then
/// snapped to the grid without leaving the limits.
pub fn compute_resize(
    start_size: Size,
    origin: Position,
    pointer: Position,
    direction: ResizeDirection,
    limits: &ResizeLimits,
) -> Size {
    let mut size = start_size;
    if direction.resizes_width() {
        size.width = snap_within(
            start_size.width + (pointer.x - origin.x),
            limits.grid_size,
            limits.min.width,
            limits.max.width,
        );
    }
    if direction.resizes_height() {
        size.height = snap_within(
            start_size.height + (pointer.y - origin.y),
            limits.grid_size,
            limits.min.height,
            limits.max.height,
        );
    }
    size
}

// ---------------------------------------------------------------------------
// Pointer capture
// ---------------------------------------------------------------------------

/// A captured pointer plus whatever transient listeners the host installed
/// for the gesture.
pub trait PointerCapture: Send {
    /// Release the pointer and remove the gesture's listeners.
    fn release(&mut self);
}

/// Capture that holds nothing; for hosts without pointer capture.
#[derive(Debug, Default)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn release(&mut self) {}
}

/// Owns a capture for the lifetime of one gesture and releases it on drop.
struct CaptureGuard(Box<dyn PointerCapture>);

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

type SizeCallback = Box<dyn FnMut(Size) + Send>;

struct Drag {
    origin: Position,
    direction: ResizeDirection,
    start_size: Size,
    current: Size,
    _capture: CaptureGuard,
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEnd {
    Completed,
    Cancelled,
}

/// Drives one panel's resize gestures.
///
/// `on_resize` fires on every pointer move with the clamped, snapped size;
/// `on_resize_end` fires once per gesture with the last computed size.
pub struct ResizeController {
    limits: ResizeLimits,
    on_resize: SizeCallback,
    on_resize_end: Option<SizeCallback>,
    drag: Option<Drag>,
}

impl ResizeController {
    pub fn new(limits: ResizeLimits, on_resize: impl FnMut(Size) + Send + 'static) -> Self {
        Self {
            limits,
            on_resize: Box::new(on_resize),
            on_resize_end: None,
            drag: None,
        }
    }

    /// Register a callback for the end of each gesture.
    pub fn on_resize_end(mut self, callback: impl FnMut(Size) + Send + 'static) -> Self {
        self.on_resize_end = Some(Box::new(callback));
        self
    }

    pub fn limits(&self) -> &ResizeLimits {
        &self.limits
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Direction of the active gesture, if any.
    pub fn direction(&self) -> Option<ResizeDirection> {
        self.drag.as_ref().map(|d| d.direction)
    }

    /// Start a gesture at `pointer`, taking ownership of `capture`.
    ///
    /// A gesture that is still active is ended first, as if cancelled.
    pub fn begin_resize(
        &mut self,
        pointer: Position,
        direction: ResizeDirection,
        start_size: Size,
        capture: Box<dyn PointerCapture>,
    ) {
        if self.drag.is_some() {
            tracing::debug!("Resize gesture restarted before the previous one ended");
            self.finish(GestureEnd::Cancelled);
        }
        self.drag = Some(Drag {
            origin: pointer,
            direction,
            start_size,
            current: start_size,
            _capture: CaptureGuard(capture),
        });
    }

    /// Feed a pointer move. Returns the emitted size, or `None` when idle.
    pub fn pointer_move(&mut self, pointer: Position) -> Option<Size> {
        let drag = self.drag.as_mut()?;
        let size = compute_resize(
            drag.start_size,
            drag.origin,
            pointer,
            drag.direction,
            &self.limits,
        );
        drag.current = size;
        (self.on_resize)(size);
        Some(size)
    }

    /// End the gesture normally. Returns the final size, or `None` when idle.
    pub fn pointer_up(&mut self) -> Option<Size> {
        self.finish(GestureEnd::Completed)
    }

    /// End the gesture because the pointer was lost (focus change, etc.).
    ///
    /// The last computed size is kept; nothing is rolled back.
    pub fn pointer_cancel(&mut self) -> Option<Size> {
        self.finish(GestureEnd::Cancelled)
    }

    fn finish(&mut self, how: GestureEnd) -> Option<Size> {
        let drag = self.drag.take()?;
        let size = drag.current;
        // Release before notifying so callbacks observe an idle controller.
        drop(drag);
        tracing::trace!(?how, width = size.width, height = size.height, "Resize gesture ended");
        if let Some(callback) = self.on_resize_end.as_mut() {
            callback(size);
        }
        Some(size)
    }
}
