use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bus::{MessageBus, SnipCommand};

/// Raw pointer position in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Normalized selection rectangle: top-left origin, width/height never
/// negative regardless of drag direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnipRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl SnipRegion {
    /// Normalize two raw drag points into a rectangle. The origin is
    /// recomputed from the smaller coordinate on each axis, so dragging
    /// up/left gives the same rectangle as down/right.
    pub fn from_points(start: Point, end: Point) -> Self {
        Self {
            x: start.x.min(end.x),
            y: start.y.min(end.y),
            width: (end.x - start.x).abs(),
            height: (end.y - start.y).abs(),
        }
    }
}

/// Evaluate a completed drag gesture against the accidental-click threshold.
/// Returns `None` when either dimension is below `min_px`.
pub fn select_region(start: Point, end: Point, min_px: i32) -> Option<SnipRegion> {
    let region = SnipRegion::from_points(start, end);
    if region.width < min_px || region.height < min_px {
        None
    } else {
        Some(region)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// Overlay not shown, ignoring input.
    Hidden,
    /// Overlay shown, waiting for a drag to start.
    Armed,
    /// Drag in progress since `start`.
    Selecting { start: Point },
}

/// The transparent full-screen selection layer.
///
/// Pointer events arrive from the host window; the qualifying rectangle is
/// published on the injected bus as `SnipComplete`. Live preview rectangles
/// during the drag are returned to the caller for redraw and are never the
/// emitted value.
pub struct CaptureSurface {
    state: SurfaceState,
    min_selection_px: i32,
    bus: MessageBus,
}

impl CaptureSurface {
    pub fn new(min_selection_px: i32, bus: MessageBus) -> Self {
        Self {
            state: SurfaceState::Hidden,
            min_selection_px,
            bus,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// External "start" request: show the surface and listen for a drag.
    pub fn arm(&mut self) {
        self.state = SurfaceState::Armed;
    }

    /// External "reset" request: drop any in-progress drag and re-arm.
    pub fn reset(&mut self) {
        debug!("capture surface reset");
        self.state = SurfaceState::Armed;
    }

    pub fn pointer_pressed(&mut self, at: Point) {
        match self.state {
            SurfaceState::Armed => self.state = SurfaceState::Selecting { start: at },
            // A press while hidden or mid-drag carries no meaning.
            SurfaceState::Hidden | SurfaceState::Selecting { .. } => {}
        }
    }

    /// Intermediate motion during a drag yields the rectangle to preview.
    pub fn pointer_moved(&self, at: Point) -> Option<SnipRegion> {
        match self.state {
            SurfaceState::Selecting { start } => Some(SnipRegion::from_points(start, at)),
            _ => None,
        }
    }

    /// Finish the gesture. A qualifying selection hides the surface and goes
    /// out on the bus; a sub-threshold one re-arms with the preview cleared.
    pub fn pointer_released(&mut self, at: Point) -> Option<SnipRegion> {
        let SurfaceState::Selecting { start } = self.state else {
            return None;
        };

        match select_region(start, at, self.min_selection_px) {
            Some(region) => {
                self.state = SurfaceState::Hidden;
                self.bus.send_command(SnipCommand::SnipComplete(region));
                Some(region)
            }
            None => {
                debug!("selection below threshold, re-arming");
                self.state = SurfaceState::Armed;
                None
            }
        }
    }
}
