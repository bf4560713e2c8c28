//! Document assembly: place a captured raster on a single PDF page.
//!
//! The image is scaled to the full page width with its aspect ratio kept
//! exactly and anchored at the top-left corner of the page. Captures taller
//! than the page overflow it and are clipped at the bottom edge; output is
//! always exactly one page.

pub mod pdf;

use crate::capture::CaptureResult;
use crate::{Error, Result};
use pdf::{fmt_num, PdfWriter, PT_PER_MM};
use serde::{Deserialize, Serialize};

/// Output page format, portrait orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    A4,
    Letter,
    Custom { width_mm: f64, height_mm: f64 },
}

impl PageFormat {
    /// Page width and height in millimetres
    pub fn size_mm(&self) -> Result<(f64, f64)> {
        let (w, h) = match *self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::Custom { width_mm, height_mm } => (width_mm, height_mm),
        };
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(Error::AssemblyFailure(format!(
                "Invalid page size {}x{}mm",
                w, h
            )));
        }
        Ok((w, h))
    }
}

/// Geometry of the single output page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub image_width_mm: f64,
    /// `image_height_px * page_width_mm / image_width_px`
    pub image_height_mm: f64,
}

impl PageLayout {
    pub fn compute(image_width: u32, image_height: u32, format: PageFormat) -> Result<Self> {
        let (page_width_mm, page_height_mm) = format.size_mm()?;
        if image_width == 0 || image_height == 0 {
            return Err(Error::AssemblyFailure(format!(
                "Cannot place a {}x{} image",
                image_width, image_height
            )));
        }
        let image_height_mm = image_height as f64 * page_width_mm / image_width as f64;
        Ok(Self {
            page_width_mm,
            page_height_mm,
            image_width_mm: page_width_mm,
            image_height_mm,
        })
    }

    /// Whether the image runs past the bottom of the page
    pub fn overflows(&self) -> bool {
        self.image_height_mm > self.page_height_mm
    }

    pub fn page_count(&self) -> usize {
        1
    }
}

/// An assembled, ready-to-save document
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub layout: PageLayout,
    pub bytes: Vec<u8>,
}

/// Build a one-page PDF containing `capture` scaled to the page width.
pub fn assemble(capture: &CaptureResult, format: PageFormat) -> Result<AssembledDocument> {
    if capture.is_empty() {
        return Err(Error::AssemblyFailure("No image data to assemble".into()));
    }
    let layout = PageLayout::compute(capture.width, capture.height, format)?;
    if layout.overflows() {
        log::warn!(
            "capture is {:.1}mm tall but the page holds {:.1}mm; content past the page is clipped",
            layout.image_height_mm,
            layout.page_height_mm
        );
    }

    let page_w = layout.page_width_mm * PT_PER_MM;
    let page_h = layout.page_height_mm * PT_PER_MM;
    let img_w = layout.image_width_mm * PT_PER_MM;
    let img_h = layout.image_height_mm * PT_PER_MM;

    let mut w = PdfWriter::new();
    let catalog = w.allocate_object();
    let pages = w.allocate_object();
    let page = w.allocate_object();
    let image = w.allocate_object();
    let contents = w.allocate_object();
    let info = w.allocate_object();

    w.write_object(catalog, &format!("<< /Type /Catalog /Pages {} 0 R >>", pages));
    w.write_object(pages, &format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", page));
    w.write_object(
        page,
        &format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources << /XObject << /Im0 {} 0 R >> /ProcSet [/PDF /ImageC] >> /Contents {} 0 R >>",
            pages,
            fmt_num(page_w),
            fmt_num(page_h),
            image,
            contents
        ),
    );
    w.write_stream_object(
        image,
        &format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
            capture.width, capture.height
        ),
        &capture.data,
    );
    // PDF origin is bottom-left; anchor the image's top edge to the page top
    let ops = format!(
        "q\n{} 0 0 {} 0 {} cm\n/Im0 Do\nQ\n",
        fmt_num(img_w),
        fmt_num(img_h),
        fmt_num(page_h - img_h)
    );
    w.write_stream_object(contents, "", ops.as_bytes());
    w.write_object(
        info,
        &format!("<< /Producer ({}) >>", pdf::escape_text(concat!("snapdoc ", env!("CARGO_PKG_VERSION")))),
    );

    let bytes = w.finish(catalog, Some(info));
    log::debug!("assembled {} byte document", bytes.len());
    Ok(AssembledDocument { layout, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn fake_capture(width: u32, height: u32) -> CaptureResult {
        CaptureResult {
            width,
            height,
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }
    }

    #[test]
    fn image_height_keeps_aspect_ratio() {
        for (w, h, page) in [
            (1200u32, 800u32, PageFormat::A4),
            (1200, 5000, PageFormat::A4),
            (1, 1, PageFormat::Letter),
            (333, 777, PageFormat::Custom { width_mm: 100.0, height_mm: 50.0 }),
            (7919, 3, PageFormat::A4),
        ] {
            let layout = PageLayout::compute(w, h, page).unwrap();
            let (pw, _) = page.size_mm().unwrap();
            let expected = h as f64 * pw / w as f64;
            assert!((layout.image_height_mm - expected).abs() <= expected * 1e-9);
            assert_eq!(layout.image_width_mm, pw);
        }
    }

    #[test]
    fn tall_capture_stays_on_one_page() {
        let doc = assemble(&fake_capture(1200, 6000), PageFormat::A4).unwrap();
        assert!(doc.layout.overflows());
        assert_eq!(doc.layout.page_count(), 1);
        assert_eq!(doc.layout.page_height_mm, 297.0);
        let count = doc.bytes.windows(11).filter(|w| *w == b"/Type /Page").count();
        // "/Type /Pages" also matches the prefix once
        assert_eq!(count, 2);
        assert!(contains(&doc.bytes, b"/Count 1"));
    }

    #[test]
    fn short_capture_fits() {
        let doc = assemble(&fake_capture(1200, 600), PageFormat::A4).unwrap();
        assert!(!doc.layout.overflows());
        assert!((doc.layout.image_height_mm - 105.0).abs() < 1e-9);
    }

    #[test]
    fn output_is_a_pdf_with_dct_image() {
        let doc = assemble(&fake_capture(10, 20), PageFormat::A4).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-1.4"));
        assert!(doc.bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&doc.bytes, b"/DCTDecode"));
        assert!(contains(&doc.bytes, b"/MediaBox [0 0 595.2756 841.8898]"));
    }

    #[test]
    fn invalid_geometry_is_an_assembly_failure() {
        let bad_page = PageFormat::Custom { width_mm: 0.0, height_mm: 297.0 };
        assert!(matches!(assemble(&fake_capture(10, 10), bad_page), Err(Error::AssemblyFailure(_))));
        assert!(matches!(PageLayout::compute(0, 10, PageFormat::A4), Err(Error::AssemblyFailure(_))));
        let nan_page = PageFormat::Custom { width_mm: f64::NAN, height_mm: 1.0 };
        assert!(nan_page.size_mm().is_err());
    }

    #[test]
    fn empty_capture_is_rejected() {
        let empty = CaptureResult { width: 10, height: 10, data: Vec::new() };
        assert!(matches!(assemble(&empty, PageFormat::A4), Err(Error::AssemblyFailure(_))));
    }
}
