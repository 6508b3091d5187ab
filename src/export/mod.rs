//! Export module - "Copy as PNG" button wiring and clipboard export
//!
//! The handler only talks to injected capabilities (element lookup, image
//! rendering, fetching, clipboard, alerts), so the GUI supplies the real ones
//! and tests supply doubles.

mod clipboard;
mod document;
mod error;
mod fetch;
mod handler;
mod render;
mod setup;

#[cfg(test)]
mod testing;

use std::time::Duration;

pub use clipboard::{ClipboardAccess, ClipboardItem, SystemClipboard};
pub use document::{ChartSurface, ClickHandler, Document, TriggerButton};
pub use error::ExportError;
pub use fetch::{encode_data_uri, Blob, DataUriFetcher, Fetcher};
pub use handler::{Alerter, CopyPngHandler};
pub use render::{ImageOptions, ImageRenderer, PlottersImageRenderer};
pub use setup::spawn_copy_button_setup;

/// Id of the trigger button.
pub const TRIGGER_ID: &str = "copy-png-btn";
/// Id of the container holding the chart.
pub const CONTAINER_ID: &str = "my-graph";
/// Class of the chart surface inside the container.
pub const SURFACE_CLASS: &str = "js-plotly-plot";

pub const EXPORT_WIDTH: u32 = 800;
pub const EXPORT_HEIGHT: u32 = 600;
pub const PNG_MIME: &str = "image/png";

/// Delay between lookups while the trigger button is absent.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const SURFACE_MISSING_MESSAGE: &str = "Graph div not found";
pub const CLIPBOARD_UNSUPPORTED_MESSAGE: &str = "Clipboard API not supported in this browser";
pub const SUCCESS_MESSAGE: &str = "Graph copied to clipboard as PNG!";
pub const FAILURE_PREFIX: &str = "Failed to copy image: ";
