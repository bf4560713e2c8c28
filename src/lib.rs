//! snapdoc
//!
//! Headless capture of a rendered dashboard region into a downloadable,
//! single-page PDF report.
//!
//! # Pipeline
//!
//! - **Visibility toggling**: elements marked non-exportable are hidden for the
//!   duration of a capture and restored on every exit path
//! - **Snapshot capture**: the target subtree is laid out at a fixed width,
//!   painted over the theme background and encoded as JPEG
//! - **Document assembly**: the raster is scaled to the page width and written
//!   as a one-page PDF handed to a download sink
//!
//! # Example
//!
//! ```no_run
//! use snapdoc::{Document, ExportConfig, Exporter};
//! use snapdoc::platform::FileDownloader;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let html = std::fs::read_to_string("dashboard.html")?;
//! let document = Document::parse(&html).into_shared();
//! let exporter = Exporter::new(
//!     document,
//!     ExportConfig::default(),
//!     Arc::new(FileDownloader::new("reports")),
//! )?;
//! let outcome = exporter.export("report-content", "FinHealth_Report.pdf").await;
//! if !outcome.success {
//!     eprintln!("{}", outcome.user_message());
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

pub mod dom;
pub use dom::{Document, NodeId, SharedDocument};

// Layout, paint and raster stages behind the capture engine
pub mod rendering;

pub mod capture;
pub use capture::{CaptureOptions, CaptureResult, RasterEngine, SnapshotEngine};

pub mod visibility;
pub use visibility::{with_hidden_exclusions, ExclusionGuard};

pub mod assemble;
pub use assemble::{AssembledDocument, PageFormat, PageLayout};

pub mod export;
pub use export::{report_filename, ExportOutcome, ExportStatus, Exporter};

// Download sinks
pub mod platform;

// File and URL page loading
pub mod source;

/// Light or dark rendering mode of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Background fill used behind captured content
    pub fn background_fill(self) -> &'static str {
        match self {
            Theme::Light => "#ffffff",
            Theme::Dark => "#020617",
        }
    }

    /// Default text color when content doesn't set one
    pub fn foreground_fill(self) -> &'static str {
        match self {
            Theme::Light => "#0f172a",
            Theme::Dark => "#e2e8f0",
        }
    }
}

/// Configuration for capture and export
///
/// The defaults match the dashboard's report export: a 1200px layout width
/// with 40px of padding, JPEG quality 95 and an A4 portrait page.
///
/// # Examples
///
/// ```
/// let cfg = snapdoc::ExportConfig::default();
/// assert_eq!(cfg.capture_width, 1200);
/// assert_eq!(cfg.exclude_marker, "no-print");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Nominal layout width of the capture in pixels, independent of any viewport
    pub capture_width: u32,
    /// Padding around the captured content in pixels
    pub padding: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Output page format
    pub page_format: PageFormat,
    /// Class marking elements that must never appear in an export
    pub exclude_marker: String,
    /// Filename used when the caller doesn't supply one
    pub default_filename: String,
    /// Deadline for the capture stage in milliseconds (0 => disabled)
    pub capture_timeout_ms: u64,
    /// Deadline for decoding the captured image in milliseconds (0 => disabled)
    pub decode_timeout_ms: u64,
    /// Timeout for loading a page from a URL in milliseconds (0 => disabled)
    pub load_timeout_ms: u64,
    /// User agent sent when loading pages over HTTP
    pub user_agent: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            capture_width: 1200,
            padding: 40,
            jpeg_quality: 95,
            page_format: PageFormat::A4,
            exclude_marker: "no-print".to_string(),
            default_filename: "FinHealth_Report.pdf".to_string(),
            capture_timeout_ms: 30000,
            decode_timeout_ms: 5000,
            load_timeout_ms: 30000,
            user_agent: format!("snapdoc/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExportConfig {
    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: ExportConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture_width <= self.padding.saturating_mul(2) {
            return Err(Error::ConfigError(format!(
                "capture_width {} leaves no room inside {}px padding",
                self.capture_width, self.padding
            )));
        }
        if self.capture_width > rendering::MAX_RASTER_DIMENSION {
            return Err(Error::ConfigError(format!(
                "capture_width {} exceeds the {}px raster limit",
                self.capture_width,
                rendering::MAX_RASTER_DIMENSION
            )));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(Error::ConfigError(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.exclude_marker.trim().is_empty() {
            return Err(Error::ConfigError("exclude_marker must not be empty".into()));
        }
        self.page_format.size_mm().map_err(|e| Error::ConfigError(e.to_string()))?;
        Ok(())
    }
}
