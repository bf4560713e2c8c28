//! Rendering stages used by the capture engine: layout, paint, raster.

pub mod layout;
pub mod paint;
pub mod raster;

use crate::dom::{Document, NodeId};
use crate::{Error, Result};
use image::RgbImage;

pub use layout::{layout_subtree, Layout, LayoutParams};
pub use paint::{build_display_list, parse_color, PaintCommand, Rgb};

/// Largest width or height a capture may have; the JPEG format's limit
pub const MAX_RASTER_DIMENSION: u32 = u16::MAX as u32;

/// Run layout, paint and raster for one subtree.
///
/// Layouts wider or taller than [`MAX_RASTER_DIMENSION`] are rejected before
/// any pixel buffer is allocated.
pub fn render_subtree(
    doc: &Document,
    root: NodeId,
    params: &LayoutParams<'_>,
    background: Rgb,
) -> Result<RgbImage> {
    let layout = layout_subtree(doc, root, params);
    if layout.width > MAX_RASTER_DIMENSION || layout.height > MAX_RASTER_DIMENSION {
        return Err(Error::CaptureFailure(format!(
            "Capture too large ({}x{}px); each side must be at most {}px",
            layout.width, layout.height, MAX_RASTER_DIMENSION
        )));
    }
    let commands = build_display_list(&layout, background);
    log::debug!(
        "painting {}x{} with {} commands",
        layout.width,
        layout.height,
        commands.len()
    );
    Ok(raster::rasterize(layout.width, layout.height, &commands))
}
