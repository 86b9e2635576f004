use std::collections::HashMap;

use tracing::{debug, warn};

/// The two host windows the client drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowId {
    /// Result/preview presentation window.
    Main,
    /// Transparent full-screen capture overlay.
    Overlay,
}

/// Host-provided window handle. The shell implements this against its real
/// windows; tests and headless runs use stand-ins.
pub trait WindowHandle: Send {
    fn show(&self);
    fn hide(&self);
    fn focus(&self);
    fn set_ignore_mouse_events(&self, ignore: bool, forward: bool);
}

/// Explicit registry of host windows, owned by the application root and
/// passed by reference to whoever needs to show/hide/focus one. Replaces
/// ambient global window lookups. A missing window is tolerated and logged,
/// matching the host shell's null-window behavior.
#[derive(Default)]
pub struct WindowRegistry {
    windows: HashMap<WindowId, Box<dyn WindowHandle>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: WindowId, handle: Box<dyn WindowHandle>) {
        self.windows.insert(id, handle);
    }

    pub fn show(&self, id: WindowId) {
        self.with(id, "show", |w| w.show());
    }

    pub fn hide(&self, id: WindowId) {
        self.with(id, "hide", |w| w.hide());
    }

    pub fn focus(&self, id: WindowId) {
        self.with(id, "focus", |w| w.focus());
    }

    pub fn set_ignore_mouse_events(&self, id: WindowId, ignore: bool, forward: bool) {
        self.with(id, "set_ignore_mouse_events", |w| {
            w.set_ignore_mouse_events(ignore, forward)
        });
    }

    fn with(&self, id: WindowId, op: &str, f: impl FnOnce(&dyn WindowHandle)) {
        match self.windows.get(&id) {
            Some(handle) => f(handle.as_ref()),
            None => warn!("no {:?} window registered, {} skipped", id, op),
        }
    }
}

/// No-op handle for headless runs; logs each operation.
pub struct HeadlessWindow {
    id: WindowId,
}

impl HeadlessWindow {
    pub fn new(id: WindowId) -> Self {
        Self { id }
    }
}

impl WindowHandle for HeadlessWindow {
    fn show(&self) {
        debug!("{:?} window: show", self.id);
    }

    fn hide(&self) {
        debug!("{:?} window: hide", self.id);
    }

    fn focus(&self) {
        debug!("{:?} window: focus", self.id);
    }

    fn set_ignore_mouse_events(&self, ignore: bool, forward: bool) {
        debug!(
            "{:?} window: ignore_mouse_events={} forward={}",
            self.id, ignore, forward
        );
    }
}
