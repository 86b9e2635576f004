use tokio::sync::mpsc;
use tracing::warn;

use crate::api::AnalysisResult;
use crate::overlay::{CaptureImage, SnipRegion};
use crate::windows::WindowId;

/// Messages flowing toward the orchestrator: user intent and the capture
/// surface's completed selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SnipCommand {
    /// Arm the capture surface and start a cycle.
    StartSnip,
    /// The capture surface finished a qualifying drag.
    SnipComplete(SnipRegion),
    /// Clear the current capture/result and return to idle.
    Dismiss,
    /// Toggle input transparency of a host window.
    SetIgnoreMouseEvents {
        window: WindowId,
        ignore: bool,
        forward: bool,
    },
    /// Stop the event loop.
    Shutdown,
}

/// Messages flowing toward the presentation surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Clear any in-progress selection preview and re-arm the overlay.
    ResetSnip,
    /// Reveal the preview: full capture plus the selected rectangle.
    SnipStart {
        image: CaptureImage,
        crop: SnipRegion,
    },
    /// Analysis finished, render the result.
    SnipSuccess(AnalysisResult),
    /// The cycle was aborted before a result existed.
    SnipAborted { reason: String },
}

/// Typed two-channel message bus between the host shell, capture surface and
/// orchestrator. Cloneable; each surface gets its own handle instead of
/// looking channels up ambiently.
#[derive(Clone)]
pub struct MessageBus {
    commands: mpsc::UnboundedSender<SnipCommand>,
    events: mpsc::UnboundedSender<SurfaceEvent>,
}

pub struct BusReceivers {
    pub commands: mpsc::UnboundedReceiver<SnipCommand>,
    pub events: mpsc::UnboundedReceiver<SurfaceEvent>,
}

pub fn channel() -> (MessageBus, BusReceivers) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (
        MessageBus {
            commands: command_tx,
            events: event_tx,
        },
        BusReceivers {
            commands: command_rx,
            events: event_rx,
        },
    )
}

impl MessageBus {
    pub fn send_command(&self, command: SnipCommand) {
        if self.commands.send(command).is_err() {
            warn!("command channel closed, message dropped");
        }
    }

    pub fn publish(&self, event: SurfaceEvent) {
        if self.events.send(event).is_err() {
            warn!("event channel closed, message dropped");
        }
    }
}
