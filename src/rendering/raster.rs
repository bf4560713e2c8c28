/// Rasterizer and JPEG encoder for paint command lists

use crate::rendering::layout::CHAR_WIDTH;
use crate::rendering::paint::PaintCommand;
use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

/// Glyphs are drawn as solid cells inside each character slot
const GLYPH_WIDTH: u32 = 6;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_TOP: u32 = 2;

pub fn rasterize(width: u32, height: u32, commands: &[PaintCommand]) -> RgbImage {
    let mut img = RgbImage::new(width.max(1), height.max(1));
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgb } => {
                fill_rect(&mut img, *x, *y, *width, *height, *rgb);
            }
            PaintCommand::Text { x, y, text, scale, rgb } => {
                let advance = (CHAR_WIDTH * scale) as i32;
                for (i, ch) in text.chars().enumerate() {
                    if ch.is_whitespace() {
                        continue;
                    }
                    fill_rect(
                        &mut img,
                        x + i as i32 * advance,
                        y + (GLYPH_TOP * scale) as i32,
                        GLYPH_WIDTH * scale,
                        GLYPH_HEIGHT * scale,
                        *rgb,
                    );
                }
            }
        }
    }
    img
}

fn fill_rect(img: &mut RgbImage, x: i32, y: i32, width: u32, height: u32, rgb: [u8; 3]) {
    let (iw, ih) = img.dimensions();
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (x.saturating_add(width as i32)).clamp(0, iw as i32) as u32;
    let y1 = (y.saturating_add(height as i32)).clamp(0, ih as i32) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px, py, Rgb(rgb));
        }
    }
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .encode_image(img)
        .map_err(|e| Error::CaptureFailure(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}
