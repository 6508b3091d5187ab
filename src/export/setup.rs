//! Deferred wiring of the copy button.

use crate::export::{ClickHandler, CopyPngHandler, Document, POLL_INTERVAL, TRIGGER_ID};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Wrap the handler so every click spawns an independent run.
pub fn click_handler(handler: Arc<CopyPngHandler>) -> ClickHandler {
    Arc::new(move || {
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            handler.on_click().await;
        })
    })
}

/// Poll for the trigger button until it exists, then attach the handler once.
///
/// Returns the number of lookups it took. Polls forever while the button is
/// absent.
pub async fn wire_copy_button(document: Arc<dyn Document>, handler: Arc<CopyPngHandler>) -> u32 {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if let Some(button) = document.trigger(TRIGGER_ID) {
            button.set_on_click(click_handler(handler));
            tracing::info!(attempts, "copy button wired");
            return attempts;
        }
        tracing::trace!(attempts, "copy button not present yet");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Start the wiring loop on `runtime`.
pub fn spawn_copy_button_setup(
    runtime: &Handle,
    document: Arc<dyn Document>,
    handler: Arc<CopyPngHandler>,
) -> JoinHandle<u32> {
    runtime.spawn(wire_copy_button(document, handler))
}
