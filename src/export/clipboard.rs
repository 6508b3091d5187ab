//! Clipboard items and the system clipboard backend.

use crate::export::{Blob, ExportError, PNG_MIME};
use arboard::ImageData;
use async_trait::async_trait;
use std::borrow::Cow;
use std::sync::mpsc;
use std::thread;
use tokio::sync::oneshot;

/// A typed payload set for the clipboard: MIME type to blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    entries: Vec<(String, Blob)>,
}

impl ClipboardItem {
    pub fn new(mime: impl Into<String>, blob: Blob) -> Self {
        Self {
            entries: vec![(mime.into(), blob)],
        }
    }

    pub fn get(&self, mime: &str) -> Option<&Blob> {
        self.entries
            .iter()
            .find(|(m, _)| m.eq_ignore_ascii_case(mime))
            .map(|(_, blob)| blob)
    }

    pub fn types(&self) -> Vec<&str> {
        self.entries.iter().map(|(m, _)| m.as_str()).collect()
    }
}

/// Platform clipboard capability.
#[async_trait]
pub trait ClipboardAccess: Send + Sync {
    /// Whether a clipboard can be written in this environment.
    fn is_supported(&self) -> bool;

    async fn write(&self, items: Vec<ClipboardItem>) -> Result<(), ExportError>;
}

struct WriteRequest {
    png: Vec<u8>,
    reply: oneshot::Sender<Result<(), String>>,
}

/// System clipboard served by a dedicated thread.
///
/// The thread owns the `arboard::Clipboard` for the whole session; on X11
/// and Wayland the copied image is only available while that owner lives.
pub struct SystemClipboard {
    requests: mpsc::Sender<WriteRequest>,
    supported: bool,
}

impl SystemClipboard {
    /// Start the clipboard thread and check whether a clipboard is available.
    pub fn spawn() -> Self {
        let (requests, rx) = mpsc::channel::<WriteRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<bool>();

        let spawned = thread::Builder::new()
            .name("clipboard".to_string())
            .spawn(move || {
                let mut clipboard = match arboard::Clipboard::new() {
                    Ok(clipboard) => {
                        let _ = ready_tx.send(true);
                        clipboard
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "system clipboard unavailable");
                        let _ = ready_tx.send(false);
                        return;
                    }
                };

                while let Ok(request) = rx.recv() {
                    let result = decode_png(&request.png).and_then(|image| {
                        clipboard
                            .set_image(image)
                            .map_err(|e| format!("Failed to copy to clipboard: {}", e))
                    });
                    let _ = request.reply.send(result);
                }
            });

        let supported = match spawned {
            Ok(_) => ready_rx.recv().unwrap_or(false),
            Err(e) => {
                tracing::warn!(error = %e, "failed to start clipboard thread");
                false
            }
        };

        Self {
            requests,
            supported,
        }
    }
}

#[async_trait]
impl ClipboardAccess for SystemClipboard {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn write(&self, items: Vec<ClipboardItem>) -> Result<(), ExportError> {
        let blob = png_payload(&items)?;

        let (reply, response) = oneshot::channel();
        self.requests
            .send(WriteRequest {
                png: blob.bytes.clone(),
                reply,
            })
            .map_err(|_| ExportError::Clipboard("Clipboard is not available".to_string()))?;

        response
            .await
            .map_err(|_| ExportError::Clipboard("Clipboard thread stopped".to_string()))?
            .map_err(ExportError::Clipboard)
    }
}

/// The non-empty `image/png` entry among `items`.
fn png_payload(items: &[ClipboardItem]) -> Result<&Blob, ExportError> {
    let Some(blob) = items.iter().find_map(|item| item.get(PNG_MIME)) else {
        let offered: Vec<&str> = items.iter().flat_map(|item| item.types()).collect();
        tracing::warn!(?offered, "no image/png entry in clipboard items");
        return Err(ExportError::Clipboard(
            "Unsupported clipboard content".to_string(),
        ));
    };
    if blob.is_empty() {
        return Err(ExportError::Clipboard("Clipboard image is empty".to_string()));
    }
    Ok(blob)
}

/// Decode PNG bytes into the RGBA layout arboard expects.
fn decode_png(bytes: &[u8]) -> Result<ImageData<'static>, String> {
    let rgba = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| format!("Invalid PNG data: {}", e))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(ImageData {
        width: width as usize,
        height: height as usize,
        bytes: Cow::Owned(rgba.into_raw()),
    })
}
