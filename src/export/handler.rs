//! Click handler: render the chart, resolve it to a PNG blob, copy it.

use crate::export::{
    ClipboardAccess, ClipboardItem, Document, ExportError, Fetcher, ImageOptions, ImageRenderer,
    CLIPBOARD_UNSUPPORTED_MESSAGE, CONTAINER_ID, EXPORT_HEIGHT, EXPORT_WIDTH, FAILURE_PREFIX,
    PNG_MIME, SUCCESS_MESSAGE, SURFACE_CLASS, SURFACE_MISSING_MESSAGE,
};
use std::sync::Arc;

/// Blocking, user-acknowledged notification.
pub trait Alerter: Send + Sync {
    fn alert(&self, message: &str);
}

/// How one click ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Copied,
    SurfaceMissing,
    ClipboardUnsupported,
    Failed(ExportError),
}

/// Copies the dashboard chart to the clipboard as a PNG.
///
/// Holds no per-click state, so overlapping clicks run independently.
pub struct CopyPngHandler {
    document: Arc<dyn Document>,
    renderer: Arc<dyn ImageRenderer>,
    fetcher: Arc<dyn Fetcher>,
    clipboard: Arc<dyn ClipboardAccess>,
    alerter: Arc<dyn Alerter>,
}

impl CopyPngHandler {
    pub fn new(
        document: Arc<dyn Document>,
        renderer: Arc<dyn ImageRenderer>,
        fetcher: Arc<dyn Fetcher>,
        clipboard: Arc<dyn ClipboardAccess>,
        alerter: Arc<dyn Alerter>,
    ) -> Self {
        Self {
            document,
            renderer,
            fetcher,
            clipboard,
            alerter,
        }
    }

    /// Run one click to completion. Every path ends in exactly one alert.
    pub async fn on_click(&self) -> ExportOutcome {
        match self.copy_chart().await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(step = err.step(), error = %err, "failed to copy chart image");
                self.alerter.alert(&format!("{}{}", FAILURE_PREFIX, err));
                ExportOutcome::Failed(err)
            }
        }
    }

    async fn copy_chart(&self) -> Result<ExportOutcome, ExportError> {
        let Some(surface) = self.document.chart_surface(CONTAINER_ID, SURFACE_CLASS) else {
            self.alerter.alert(SURFACE_MISSING_MESSAGE);
            return Ok(ExportOutcome::SurfaceMissing);
        };

        let image = self
            .renderer
            .to_image(&surface, ImageOptions::png(EXPORT_WIDTH, EXPORT_HEIGHT))
            .await?;
        let response = self.fetcher.fetch(&image).await?;
        let blob = response.blob().await;

        if !self.clipboard.is_supported() {
            self.alerter.alert(CLIPBOARD_UNSUPPORTED_MESSAGE);
            return Ok(ExportOutcome::ClipboardUnsupported);
        }

        tracing::debug!(bytes = blob.len(), "writing chart image to clipboard");
        self.clipboard
            .write(vec![ClipboardItem::new(PNG_MIME, blob)])
            .await?;

        self.alerter.alert(SUCCESS_MESSAGE);
        Ok(ExportOutcome::Copied)
    }
}
