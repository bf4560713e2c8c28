//! Export orchestration: hide exclusions, capture, assemble, save.

use crate::assemble;
use crate::capture::{self, CaptureOptions, CaptureResult, RasterEngine, SnapshotEngine, NO_IMAGE_DATA_MESSAGE};
use crate::dom::{read_document, SharedDocument};
use crate::error::GENERIC_FAILURE_MESSAGE;
use crate::platform::Downloader;
use crate::visibility::with_hidden_exclusions;
use crate::{Error, ExportConfig, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Result of one export call, shaped as `{ "success": bool, "error"?: string }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportOutcome {
    pub fn success() -> Self {
        Self { success: true, error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        };
        Self { success: false, error: Some(message) }
    }

    /// Text shown to the user after a failed export
    pub fn user_message(&self) -> String {
        match &self.error {
            Some(e) if !self.success => format!("Export failed: {}. Please try again.", e),
            _ => "Export complete.".to_string(),
        }
    }
}

impl From<&Error> for ExportOutcome {
    fn from(err: &Error) -> Self {
        ExportOutcome::failure(err.to_string())
    }
}

/// What the export control should display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Idle,
    Generating,
}

impl ExportStatus {
    pub fn label(self) -> &'static str {
        match self {
            ExportStatus::Idle => "Export PDF",
            ExportStatus::Generating => "Generating...",
        }
    }
}

/// Filename the dashboard uses for an industry report
pub fn report_filename(industry: &str) -> String {
    format!("FinHealth_Analysis_{}.pdf", industry)
}

/// Sets the in-progress flag for as long as it lives
struct InProgress<'a>(&'a AtomicBool);

impl<'a> InProgress<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InProgress(flag))
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single entry point for turning a live document region into a saved PDF.
///
/// At most one export runs per document: the busy flag lives on the
/// [`SharedDocument`], so a call made while any exporter over the same page
/// is in flight fails immediately with [`Error::ExportInProgress`].
pub struct Exporter {
    document: SharedDocument,
    config: ExportConfig,
    engine: Arc<dyn SnapshotEngine>,
    downloader: Arc<dyn Downloader>,
}

impl Exporter {
    /// Fails with [`Error::ConfigError`] if `config` does not validate.
    pub fn new(document: SharedDocument, config: ExportConfig, downloader: Arc<dyn Downloader>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            document,
            config,
            engine: Arc::new(RasterEngine),
            downloader,
        })
    }

    /// Replace the capture engine
    pub fn with_engine(mut self, engine: Arc<dyn SnapshotEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn is_exporting(&self) -> bool {
        self.document.is_exporting()
    }

    pub fn status(&self) -> ExportStatus {
        if self.is_exporting() {
            ExportStatus::Generating
        } else {
            ExportStatus::Idle
        }
    }

    /// Capture `target_id` and save it as `filename`. Never returns an error;
    /// every failure is reported through the outcome.
    pub async fn export(&self, target_id: &str, filename: &str) -> ExportOutcome {
        let _busy = match InProgress::acquire(self.document.export_flag()) {
            Some(guard) => guard,
            None => {
                log::warn!("[export] rejected #{}: another export is running", target_id);
                return ExportOutcome::from(&Error::ExportInProgress);
            }
        };

        match self.run(target_id, filename).await {
            Ok(()) => {
                log::info!("[export] saved {}", filename);
                ExportOutcome::success()
            }
            Err(err) => {
                log::error!("[export] #{} failed: {}", target_id, err);
                ExportOutcome::from(&err)
            }
        }
    }

    /// Export under the configured default filename
    pub async fn export_default(&self, target_id: &str) -> ExportOutcome {
        let filename = self.config.default_filename.clone();
        self.export(target_id, &filename).await
    }

    async fn run(&self, target_id: &str, filename: &str) -> Result<()> {
        let capture = self.capture(target_id).await?;
        log::info!("[export] compiling {}x{} capture into a document", capture.width, capture.height);
        let document = assemble::assemble(&capture, self.config.page_format)?;
        self.downloader.save(filename, &document.bytes)?;
        Ok(())
    }

    /// Hide exclusions, capture the target and decode its dimensions.
    ///
    /// Excluded regions are restored before this returns, whatever the result.
    pub async fn capture(&self, target_id: &str) -> Result<CaptureResult> {
        let (root, theme) = {
            let doc = read_document(&self.document);
            let root = doc.element_by_id(target_id).ok_or(Error::TargetNotFound)?;
            (root, doc.theme())
        };
        log::info!("[export] capturing #{} with {:?} theme", target_id, theme);
        let options = CaptureOptions::for_theme(&self.config, theme);

        with_hidden_exclusions(&self.document, root, &self.config.exclude_marker, || async move {
            let snapshot = read_document(&self.document).clone();
            let captured = with_deadline(
                self.config.capture_timeout_ms,
                self.engine.capture(snapshot, root, options),
            )
            .await?;
            if captured.is_empty() {
                return Err(Error::CaptureFailure(NO_IMAGE_DATA_MESSAGE.into()));
            }
            with_deadline(self.config.decode_timeout_ms, capture::decode(captured)).await
        })
        .await
    }
}

/// Bound `fut` by `timeout_ms`; zero disables the deadline.
async fn with_deadline<T>(timeout_ms: u64, fut: impl Future<Output = Result<T>>) -> Result<T> {
    if timeout_ms == 0 {
        return fut.await;
    }
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(res) => res,
        Err(_) => Err(Error::CaptureTimeout(timeout_ms)),
    }
}
