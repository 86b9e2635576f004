use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::{AnalysisResult, Analyzer};
use crate::bus::{MessageBus, SnipCommand, SurfaceEvent};
use crate::crop;
use crate::error::SnipError;
use crate::overlay::{CaptureImage, ScreenGrabber, SnipRegion};
use crate::windows::{WindowId, WindowRegistry};

/// Phase of the capture cycle. Exactly one is active; transitions are
/// strictly sequential and gate re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Ready,
    CaptureActive,
    Uploading,
    Complete,
}

/// Sequences a capture cycle: arm overlay, receive the selection, grab the
/// screen, crop the preview, call the analysis backend, surface the result.
///
/// Owns the single capture/region/result triple; everything else reads it
/// through the published events. At most one grab or backend call is ever
/// outstanding; `Uploading` drops new start requests.
pub struct Orchestrator<G, A> {
    state: UiState,
    windows: WindowRegistry,
    bus: MessageBus,
    grabber: G,
    analyzer: A,
    image: Option<CaptureImage>,
    preview: Option<CaptureImage>,
    region: Option<SnipRegion>,
    result: Option<AnalysisResult>,
}

impl<G, A> Orchestrator<G, A>
where
    G: ScreenGrabber,
    A: Analyzer,
{
    pub fn new(windows: WindowRegistry, bus: MessageBus, grabber: G, analyzer: A) -> Self {
        Self {
            state: UiState::Ready,
            windows,
            bus,
            grabber,
            analyzer,
            image: None,
            preview: None,
            region: None,
            result: None,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Cropped preview of the current selection, for the main surface.
    pub fn preview(&self) -> Option<&CaptureImage> {
        self.preview.as_ref()
    }

    /// Process commands until the channel closes or `Shutdown` arrives.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SnipCommand>) {
        info!("orchestrator running");
        while let Some(command) = commands.recv().await {
            if command == SnipCommand::Shutdown {
                info!("shutdown requested");
                break;
            }
            self.handle(command).await;
        }
    }

    pub async fn handle(&mut self, command: SnipCommand) {
        match command {
            SnipCommand::StartSnip => self.begin_capture(),
            SnipCommand::SnipComplete(region) => self.run_cycle(region).await,
            SnipCommand::Dismiss => self.dismiss(),
            SnipCommand::SetIgnoreMouseEvents {
                window,
                ignore,
                forward,
            } => self.windows.set_ignore_mouse_events(window, ignore, forward),
            SnipCommand::Shutdown => {}
        }
    }

    fn begin_capture(&mut self) {
        if self.state != UiState::Ready {
            warn!("start request dropped, cycle already in {:?}", self.state);
            return;
        }

        info!("capture cycle started");
        self.windows.show(WindowId::Overlay);
        self.windows.focus(WindowId::Overlay);
        self.bus.publish(SurfaceEvent::ResetSnip);
        self.state = UiState::CaptureActive;
    }

    async fn run_cycle(&mut self, region: SnipRegion) {
        if self.state != UiState::CaptureActive {
            warn!("selection dropped, cycle in {:?}", self.state);
            return;
        }

        self.windows.hide(WindowId::Overlay);
        self.windows.show(WindowId::Main);
        self.state = UiState::Uploading;

        let image = match self.grabber.grab() {
            Ok(image) => image,
            Err(e) => {
                self.abort_cycle("screen grab", e);
                return;
            }
        };

        let preview = match crop::crop_preview(&image, region) {
            Ok(preview) => preview,
            Err(e) => {
                self.abort_cycle("crop", e);
                return;
            }
        };

        self.bus.publish(SurfaceEvent::SnipStart {
            image: image.clone(),
            crop: region,
        });

        // Never errors: backend and transport failures come back as the
        // fallback result.
        let result = self.analyzer.analyze_image(&image).await;

        self.image = Some(image);
        self.preview = Some(preview);
        self.region = Some(region);
        self.bus.publish(SurfaceEvent::SnipSuccess(result.clone()));
        self.result = Some(result);
        self.state = UiState::Complete;
        info!("capture cycle complete");
    }

    /// Capture-step failure: no partial result survives, and the main
    /// surface hears about it instead of being left staring at nothing.
    fn abort_cycle(&mut self, step: &str, e: SnipError) {
        error!("{} failed, aborting cycle: {}", step, e);
        self.bus.publish(SurfaceEvent::SnipAborted {
            reason: e.to_string(),
        });
        self.clear();
        self.state = UiState::Ready;
    }

    fn dismiss(&mut self) {
        match self.state {
            UiState::Complete | UiState::CaptureActive => {
                info!("dismissed from {:?}", self.state);
                self.windows.hide(WindowId::Overlay);
                self.clear();
                self.state = UiState::Ready;
            }
            UiState::Uploading => warn!("dismiss ignored while uploading"),
            UiState::Ready => {}
        }
    }

    fn clear(&mut self) {
        self.image = None;
        self.preview = None;
        self.region = None;
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus;
    use crate::error::Result;
    use crate::windows::test_support::RecordingWindow;
    use async_trait::async_trait;
    use image::RgbaImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeGrabber {
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeGrabber {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ScreenGrabber for FakeGrabber {
        fn grab(&self) -> Result<CaptureImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SnipError::NoSourceAvailable);
            }
            CaptureImage::from_rgba(&RgbaImage::new(640, 480))
        }
    }

    struct FakeAnalyzer {
        result: AnalysisResult,
    }

    #[async_trait]
    impl Analyzer for FakeAnalyzer {
        async fn analyze_image(&self, _image: &CaptureImage) -> AnalysisResult {
            self.result.clone()
        }

        async fn analyze_text(&self, _text: &str) -> AnalysisResult {
            self.result.clone()
        }
    }

    fn authentic_result() -> AnalysisResult {
        AnalysisResult {
            score: 92.0,
            reasoning: "Looks authentic".to_string(),
            sources: vec!["https://x".to_string()],
        }
    }

    fn registry_with_log() -> (WindowRegistry, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = WindowRegistry::new();
        registry.register(
            WindowId::Main,
            Box::new(RecordingWindow::new(WindowId::Main, log.clone())),
        );
        registry.register(
            WindowId::Overlay,
            Box::new(RecordingWindow::new(WindowId::Overlay, log.clone())),
        );
        (registry, log)
    }

    fn region() -> SnipRegion {
        SnipRegion {
            x: 100,
            y: 100,
            width: 200,
            height: 150,
        }
    }

    #[tokio::test]
    async fn test_full_cycle_reaches_complete_with_result() {
        let (bus, mut receivers) = bus::channel();
        let (registry, log) = registry_with_log();
        let mut orch = Orchestrator::new(
            registry,
            bus,
            FakeGrabber::new(false),
            FakeAnalyzer {
                result: authentic_result(),
            },
        );

        orch.handle(SnipCommand::StartSnip).await;
        assert_eq!(orch.state(), UiState::CaptureActive);
        assert_eq!(receivers.events.try_recv().unwrap(), SurfaceEvent::ResetSnip);

        orch.handle(SnipCommand::SnipComplete(region())).await;
        assert_eq!(orch.state(), UiState::Complete);
        assert_eq!(orch.result().unwrap().score, 92.0);
        assert!(orch.preview().is_some());

        match receivers.events.try_recv().unwrap() {
            SurfaceEvent::SnipStart { crop, .. } => assert_eq!(crop, region()),
            other => panic!("expected SnipStart, got {:?}", other),
        }
        match receivers.events.try_recv().unwrap() {
            SurfaceEvent::SnipSuccess(result) => {
                assert_eq!(result.reasoning, "Looks authentic");
                assert_eq!(result.sources.len(), 1);
            }
            other => panic!("expected SnipSuccess, got {:?}", other),
        }

        // Overlay shown+focused on start, hidden on selection, main revealed.
        let ops = log.lock().unwrap().clone();
        assert_eq!(
            ops,
            vec![
                "Overlay:show",
                "Overlay:focus",
                "Overlay:hide",
                "Main:show"
            ]
        );
    }

    #[tokio::test]
    async fn test_no_screen_source_aborts_to_ready() {
        let (bus, mut receivers) = bus::channel();
        let (registry, _log) = registry_with_log();
        let mut orch = Orchestrator::new(
            registry,
            bus,
            FakeGrabber::new(true),
            FakeAnalyzer {
                result: authentic_result(),
            },
        );

        orch.handle(SnipCommand::StartSnip).await;
        orch.handle(SnipCommand::SnipComplete(region())).await;

        assert_eq!(orch.state(), UiState::Ready);
        assert!(orch.result().is_none());
        assert!(orch.preview().is_none());

        // ResetSnip from the start, then the abort notice. No partial result.
        assert_eq!(receivers.events.try_recv().unwrap(), SurfaceEvent::ResetSnip);
        assert!(matches!(
            receivers.events.try_recv().unwrap(),
            SurfaceEvent::SnipAborted { .. }
        ));
        assert!(receivers.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_is_gated_outside_ready() {
        let (bus, _receivers) = bus::channel();
        let (registry, _log) = registry_with_log();
        let grabber = FakeGrabber::new(false);
        let calls = grabber.calls.clone();
        let mut orch = Orchestrator::new(
            registry,
            bus,
            grabber,
            FakeAnalyzer {
                result: authentic_result(),
            },
        );

        orch.handle(SnipCommand::StartSnip).await;
        orch.handle(SnipCommand::StartSnip).await;
        assert_eq!(orch.state(), UiState::CaptureActive);

        orch.handle(SnipCommand::SnipComplete(region())).await;
        assert_eq!(orch.state(), UiState::Complete);

        // A second start while Complete is dropped too: dismissal first.
        orch.handle(SnipCommand::StartSnip).await;
        assert_eq!(orch.state(), UiState::Complete);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stray_selection_outside_capture_active_is_dropped() {
        let (bus, _receivers) = bus::channel();
        let (registry, _log) = registry_with_log();
        let grabber = FakeGrabber::new(false);
        let calls = grabber.calls.clone();
        let mut orch = Orchestrator::new(
            registry,
            bus,
            grabber,
            FakeAnalyzer {
                result: authentic_result(),
            },
        );

        orch.handle(SnipCommand::SnipComplete(region())).await;
        assert_eq!(orch.state(), UiState::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dismiss_clears_triple_and_returns_ready() {
        let (bus, _receivers) = bus::channel();
        let (registry, _log) = registry_with_log();
        let mut orch = Orchestrator::new(
            registry,
            bus,
            FakeGrabber::new(false),
            FakeAnalyzer {
                result: authentic_result(),
            },
        );

        orch.handle(SnipCommand::StartSnip).await;
        orch.handle(SnipCommand::SnipComplete(region())).await;
        assert_eq!(orch.state(), UiState::Complete);

        orch.handle(SnipCommand::Dismiss).await;
        assert_eq!(orch.state(), UiState::Ready);
        assert!(orch.result().is_none());
        assert!(orch.preview().is_none());

        // Cycle can start again after dismissal.
        orch.handle(SnipCommand::StartSnip).await;
        assert_eq!(orch.state(), UiState::CaptureActive);
    }

    #[tokio::test]
    async fn test_ignore_mouse_events_routes_to_registry() {
        let (bus, _receivers) = bus::channel();
        let (registry, log) = registry_with_log();
        let mut orch = Orchestrator::new(
            registry,
            bus,
            FakeGrabber::new(false),
            FakeAnalyzer {
                result: authentic_result(),
            },
        );

        orch.handle(SnipCommand::SetIgnoreMouseEvents {
            window: WindowId::Overlay,
            ignore: true,
            forward: true,
        })
        .await;

        assert_eq!(*log.lock().unwrap(), vec!["Overlay:ignore_mouse=true"]);
    }

    #[tokio::test]
    async fn test_fallback_result_still_completes_cycle() {
        let (bus, _receivers) = bus::channel();
        let (registry, _log) = registry_with_log();
        let mut orch = Orchestrator::new(
            registry,
            bus,
            FakeGrabber::new(false),
            FakeAnalyzer {
                result: AnalysisResult::fallback(),
            },
        );

        orch.handle(SnipCommand::StartSnip).await;
        orch.handle(SnipCommand::SnipComplete(region())).await;

        assert_eq!(orch.state(), UiState::Complete);
        assert_eq!(orch.result().unwrap().score, 0.0);
    }
}
