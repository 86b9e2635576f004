pub mod api;
pub mod bus;
pub mod config;
pub mod crop;
pub mod error;
pub mod orchestrator;
pub mod overlay;
pub mod paths;
pub mod windows;

pub use api::{AnalysisClient, AnalysisResult, Analyzer};
pub use bus::{MessageBus, SnipCommand, SurfaceEvent};
pub use config::Config;
pub use error::SnipError;
pub use orchestrator::{Orchestrator, UiState};
pub use overlay::{CaptureImage, CaptureSurface, Point, ScreenGrabber, SnipRegion, XcapGrabber};
pub use windows::{WindowId, WindowRegistry};
