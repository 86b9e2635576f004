use std::io::Cursor;

use base64::Engine;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xcap::Monitor;

use crate::error::{Result, SnipError};

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// An encoded still of the screen, carried as a base64 PNG data URI, the
/// shape the presentation surfaces render directly. One exists per capture
/// cycle; the analysis client strips the prefix before transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureImage(String);

impl CaptureImage {
    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("{}{}", DATA_URI_PREFIX, encoded))
    }

    pub fn from_rgba(image: &RgbaImage) -> Result<Self> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)?;
        Ok(Self::from_png_bytes(&buf))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw base64 payload with any `data:*;base64,` prefix stripped.
    pub fn base64_payload(&self) -> &str {
        match self.0.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(";base64,")
                .map(|(_, payload)| payload)
                .unwrap_or(&self.0),
            None => &self.0,
        }
    }

    /// Decode back into pixels for cropping.
    pub fn decode(&self) -> Result<RgbaImage> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.base64_payload())
            .map_err(|e| SnipError::Payload(e.to_string()))?;
        let image = image::load_from_memory(&bytes)?;
        Ok(image.to_rgba8())
    }
}

/// Display-capture capability. The production implementation talks to the OS;
/// tests substitute canned images or failures.
pub trait ScreenGrabber {
    /// Obtain a still image of the current screen contents.
    fn grab(&self) -> Result<CaptureImage>;
}

/// Grabs the primary monitor via `xcap`, downscaled to the configured cap.
pub struct XcapGrabber {
    max_width: u32,
    max_height: u32,
}

impl XcapGrabber {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

impl ScreenGrabber for XcapGrabber {
    fn grab(&self) -> Result<CaptureImage> {
        let monitors = Monitor::all().map_err(|e| SnipError::Capture(e.to_string()))?;
        if monitors.is_empty() {
            return Err(SnipError::NoSourceAvailable);
        }

        // Primary-display policy: secondary monitors are not offered.
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(&monitors[0]);
        debug!(
            "capturing monitor {:?}x{:?}",
            monitor.width(),
            monitor.height()
        );

        let shot = monitor
            .capture_image()
            .map_err(|e| SnipError::Capture(e.to_string()))?;

        // Rebuild through raw bytes so xcap's image version never leaks into
        // our pixel types.
        let (width, height) = (shot.width(), shot.height());
        let raw = shot.into_raw();
        let image = RgbaImage::from_raw(width, height, raw)
            .ok_or_else(|| SnipError::Payload("capture buffer size mismatch".to_string()))?;

        let image = downscale_to_cap(image, self.max_width, self.max_height);
        CaptureImage::from_rgba(&image)
    }
}

/// Shrink the grab so neither dimension exceeds the cap, preserving aspect
/// ratio. Images already within bounds pass through untouched.
fn downscale_to_cap(image: RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (target_w, target_h) = scaled_dimensions(width, height, max_width, max_height);
    if (target_w, target_h) == (width, height) {
        return image;
    }
    debug!(
        "downscaling capture {}x{} -> {}x{}",
        width, height, target_w, target_h
    );
    image::imageops::resize(
        &image,
        target_w,
        target_h,
        image::imageops::FilterType::Triangle,
    )
}

fn scaled_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let target_w = ((width as f64 * scale).round() as u32).max(1);
    let target_h = ((height as f64 * scale).round() as u32).max(1);
    (target_w, target_h)
}
