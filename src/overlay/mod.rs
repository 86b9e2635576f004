pub mod screen_capture;
pub mod state;

pub use screen_capture::{CaptureImage, ScreenGrabber, XcapGrabber};
pub use state::{CaptureSurface, Point, SnipRegion, SurfaceState};
