//! Snapshot capture: render a document subtree into an encoded raster.

use crate::dom::{Document, NodeId};
use crate::rendering::{self, parse_color, LayoutParams, Rgb};
use crate::{Error, ExportConfig, Result, Theme};
use base64::Engine as _;
use futures::future::BoxFuture;
use image::GenericImageView;

/// Message used when the raster stage yields no bytes
pub const NO_IMAGE_DATA_MESSAGE: &str = "Capture failed (No image data)";

/// Encoded capture of one subtree
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub width: u32,
    pub height: u32,
    /// JPEG bytes
    pub data: Vec<u8>,
}

impl CaptureResult {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:` URL form of the capture
    pub fn data_url(&self) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// Inputs for one capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Canvas fill; should match the theme the page is displayed in
    pub background: Rgb,
    /// Default text color
    pub foreground: Rgb,
    /// Nominal layout width in pixels
    pub width: u32,
    pub padding: u32,
    pub quality: u8,
    /// Class whose nodes are omitted from the raster
    pub exclude_marker: String,
}

impl CaptureOptions {
    pub fn for_theme(config: &ExportConfig, theme: Theme) -> Self {
        Self {
            background: parse_color(theme.background_fill()).unwrap_or([255, 255, 255]),
            foreground: parse_color(theme.foreground_fill()).unwrap_or([0, 0, 0]),
            width: config.capture_width,
            padding: config.padding,
            quality: config.jpeg_quality,
            exclude_marker: config.exclude_marker.clone(),
        }
    }
}

/// Renders a document subtree into a [`CaptureResult`].
///
/// Implementations receive their own copy of the document taken at capture
/// time, so they may run on another thread without holding any lock.
pub trait SnapshotEngine: Send + Sync {
    fn capture(
        &self,
        document: Document,
        root: NodeId,
        options: CaptureOptions,
    ) -> BoxFuture<'static, Result<CaptureResult>>;
}

/// Default engine: built-in layout/paint/raster pipeline with JPEG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEngine;

impl SnapshotEngine for RasterEngine {
    fn capture(
        &self,
        document: Document,
        root: NodeId,
        options: CaptureOptions,
    ) -> BoxFuture<'static, Result<CaptureResult>> {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || render_capture(&document, root, &options))
                .await
                .map_err(|e| Error::CaptureFailure(format!("Capture task failed: {}", e)))?
        })
    }
}

/// Synchronous capture used by [`RasterEngine`].
pub fn render_capture(document: &Document, root: NodeId, options: &CaptureOptions) -> Result<CaptureResult> {
    if !document.contains(root) {
        return Err(Error::TargetNotFound);
    }
    let marker = options.exclude_marker.as_str();
    let exclude = move |doc: &Document, id: NodeId| doc.has_class(id, marker);
    let params = LayoutParams {
        width: options.width,
        padding: options.padding,
        foreground: options.foreground,
        exclude: &exclude,
    };
    let img = rendering::render_subtree(document, root, &params, options.background)?;
    let data = rendering::raster::encode_jpeg(&img, options.quality)?;
    if data.is_empty() {
        return Err(Error::CaptureFailure(NO_IMAGE_DATA_MESSAGE.into()));
    }
    Ok(CaptureResult {
        width: img.width(),
        height: img.height(),
        data,
    })
}

/// Decode the encoded image to learn its real pixel dimensions.
pub async fn decode(capture: CaptureResult) -> Result<CaptureResult> {
    tokio::task::spawn_blocking(move || -> Result<CaptureResult> {
        let decoded = image::load_from_memory_with_format(&capture.data, image::ImageFormat::Jpeg)?;
        let (width, height) = decoded.dimensions();
        Ok(CaptureResult { width, height, ..capture })
    })
    .await
    .map_err(|e| Error::CaptureFailure(format!("Image decode task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><div id="report-content">
        <h1>Quarterly health</h1>
        <div class="no-print" style="background-color: #ff0000; height: 120px">Export</div>
        <div style="background-color: #0000ff; height: 60px"></div>
    </div></body></html>"#;

    fn options(theme: Theme) -> CaptureOptions {
        CaptureOptions::for_theme(&ExportConfig::default(), theme)
    }

    #[test]
    fn capture_uses_nominal_width() {
        let doc = Document::parse(PAGE);
        let root = doc.element_by_id("report-content").unwrap();
        let res = render_capture(&doc, root, &options(Theme::Light)).unwrap();
        assert_eq!(res.width, 1200);
        assert!(res.height > 80);
        assert!(!res.is_empty());
        assert!(res.data_url().starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn excluded_nodes_are_not_painted() {
        let doc = Document::parse(PAGE);
        let root = doc.element_by_id("report-content").unwrap();
        let res = render_capture(&doc, root, &options(Theme::Light)).unwrap();
        let img = image::load_from_memory(&res.data).unwrap().to_rgb8();
        let reddish = img.pixels().any(|p| p.0[0] > 200 && p.0[1] < 80 && p.0[2] < 80);
        let bluish = img.pixels().any(|p| p.0[2] > 200 && p.0[0] < 80 && p.0[1] < 80);
        assert!(!reddish, "excluded region leaked into the raster");
        assert!(bluish, "regular content missing from the raster");
    }

    #[test]
    fn dark_theme_fills_background() {
        let doc = Document::parse(PAGE);
        let root = doc.element_by_id("report-content").unwrap();
        let opts = options(Theme::Dark);
        assert_eq!(opts.background, [2, 6, 23]);
        let res = render_capture(&doc, root, &opts).unwrap();
        let img = image::load_from_memory(&res.data).unwrap().to_rgb8();
        let corner = img.get_pixel(0, 0).0;
        for (got, want) in corner.iter().zip([2u8, 6, 23]) {
            assert!((*got as i32 - want as i32).abs() <= 6, "corner {:?}", corner);
        }
    }

    #[test]
    fn unknown_root_is_rejected() {
        let doc = Document::parse("<p>x</p>");
        let bogus = Document::parse(PAGE);
        let far = bogus.descendants(bogus.root()).last().copied().unwrap();
        assert!(matches!(
            render_capture(&doc, far, &options(Theme::Light)),
            Err(Error::TargetNotFound)
        ));
    }

    #[tokio::test]
    async fn engine_and_decode_agree_on_dimensions() {
        let doc = Document::parse(PAGE);
        let root = doc.element_by_id("report-content").unwrap();
        let captured = RasterEngine.capture(doc, root, options(Theme::Light)).await.unwrap();
        let (w, h) = (captured.width, captured.height);
        let decoded = decode(captured).await.unwrap();
        assert_eq!((decoded.width, decoded.height), (w, h));
    }

    #[tokio::test]
    async fn decode_rejects_garbage() {
        let bad = CaptureResult { width: 1, height: 1, data: vec![1, 2, 3] };
        assert!(matches!(decode(bad).await, Err(Error::CaptureFailure(_))));
    }
}
