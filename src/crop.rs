use tracing::debug;

use crate::error::{Result, SnipError};
use crate::overlay::{CaptureImage, SnipRegion};

/// Clamp a selection to the capture's bounds. Rectangles extending past the
/// image shrink instead of erroring; a rectangle entirely outside collapses
/// to zero size.
pub fn clamp_region(region: SnipRegion, image_width: u32, image_height: u32) -> SnipRegion {
    let image_width = image_width as i32;
    let image_height = image_height as i32;

    let x = region.x.clamp(0, image_width);
    let y = region.y.clamp(0, image_height);

    // Account for the part of the selection cut off by the origin clamp.
    let width = (region.width - (x - region.x)).clamp(0, image_width - x);
    let height = (region.height - (y - region.y)).clamp(0, image_height - y);

    SnipRegion {
        x,
        y,
        width,
        height,
    }
}

/// Extract the selected sub-region of a capture for preview. Pure rendering:
/// decode, clamp, blit, re-encode. The output is sized exactly to the clamped
/// rectangle.
pub fn crop_preview(image: &CaptureImage, region: SnipRegion) -> Result<CaptureImage> {
    let pixels = image.decode()?;
    let (width, height) = pixels.dimensions();

    let clamped = clamp_region(region, width, height);
    if clamped.width == 0 || clamped.height == 0 {
        return Err(SnipError::EmptyCrop);
    }
    if clamped != region {
        debug!("crop region clamped to image bounds: {:?}", clamped);
    }

    let view = image::imageops::crop_imm(
        &pixels,
        clamped.x as u32,
        clamped.y as u32,
        clamped.width as u32,
        clamped.height as u32,
    );
    CaptureImage::from_rgba(&view.to_image())
}
