//! In-app element registry backing the export flow's element lookups.

use crate::export::{ChartSurface, ClickHandler, Document, TriggerButton};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::runtime::Handle;

/// A button the GUI renders while it is mounted.
pub struct PageButton {
    pub label: String,
    on_click: Mutex<Option<ClickHandler>>,
}

impl PageButton {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            on_click: Mutex::new(None),
        }
    }

    fn handler(&self) -> Option<ClickHandler> {
        self.on_click
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TriggerButton for PageButton {
    fn set_on_click(&self, handler: ClickHandler) {
        *self
            .on_click
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handler);
    }
}

#[derive(Default)]
struct Elements {
    buttons: HashMap<String, Arc<PageButton>>,
    containers: HashMap<String, Vec<ChartSurface>>,
}

/// Buttons and chart containers currently mounted in the window.
///
/// Clicks run their handler on the tokio runtime, so the UI thread never
/// waits on an export.
pub struct Page {
    elements: RwLock<Elements>,
    runtime: Handle,
}

impl Page {
    pub fn new(runtime: Handle) -> Self {
        Self {
            elements: RwLock::new(Elements::default()),
            runtime,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Elements> {
        self.elements
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Elements> {
        self.elements
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mount a button. An already mounted button keeps its click handler.
    pub fn mount_button(&self, id: &str, label: &str) -> Arc<PageButton> {
        let mut elements = self.write();
        let button = elements
            .buttons
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(PageButton::new(label)));
        Arc::clone(button)
    }

    pub fn button(&self, id: &str) -> Option<Arc<PageButton>> {
        self.read().buttons.get(id).cloned()
    }

    /// Replace the content of a chart container.
    pub fn mount_chart(&self, container_id: &str, surface: ChartSurface) {
        tracing::debug!(container_id, class = %surface.class_name, "mounting chart");
        self.write()
            .containers
            .insert(container_id.to_string(), vec![surface]);
    }

    pub fn unmount_chart(&self, container_id: &str) {
        self.write().containers.remove(container_id);
    }

    /// Dispatch a click on the button `id`.
    ///
    /// Returns `false` when the button is absent or has no handler yet.
    pub fn click(&self, id: &str) -> bool {
        let Some(handler) = self.button(id).and_then(|b| b.handler()) else {
            tracing::debug!(id, "click ignored, no handler attached");
            return false;
        };
        self.runtime.spawn(handler());
        true
    }
}

impl Document for Page {
    fn trigger(&self, id: &str) -> Option<Arc<dyn TriggerButton>> {
        let button = self.button(id)?;
        Some(button)
    }

    fn chart_surface(&self, container_id: &str, class_name: &str) -> Option<ChartSurface> {
        self.read()
            .containers
            .get(container_id)?
            .iter()
            .find(|surface| surface.class_name == class_name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Figure;
    use tokio::sync::oneshot;

    fn surface(class_name: &str) -> ChartSurface {
        ChartSurface::new(
            class_name,
            Arc::new(Figure {
                title: "t".into(),
                x_title: "x".into(),
                y_title: "y".into(),
                subplots: vec![],
            }),
        )
    }

    #[tokio::test]
    async fn chart_lookup_needs_container_and_class() {
        let page = Page::new(Handle::current());
        assert!(page.chart_surface("my-graph", "js-plotly-plot").is_none());

        page.mount_chart("my-graph", surface("legend"));
        assert!(page.chart_surface("my-graph", "js-plotly-plot").is_none());

        page.mount_chart("my-graph", surface("js-plotly-plot"));
        assert!(page.chart_surface("my-graph", "js-plotly-plot").is_some());
        assert!(page.chart_surface("other", "js-plotly-plot").is_none());

        page.unmount_chart("my-graph");
        assert!(page.chart_surface("my-graph", "js-plotly-plot").is_none());
    }

    #[tokio::test]
    async fn remounting_a_button_keeps_its_handler() {
        let page = Page::new(Handle::current());
        assert!(page.trigger("copy-png-btn").is_none());
        assert!(!page.click("copy-png-btn"));

        let (tx, rx) = oneshot::channel::<()>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        page.mount_button("copy-png-btn", "Copy as PNG");
        let trigger = page.trigger("copy-png-btn").expect("mounted");
        trigger.set_on_click(Arc::new(move || {
            let tx = tx.lock().unwrap().take();
            Box::pin(async move {
                if let Some(tx) = tx {
                    let _ = tx.send(());
                }
            })
        }));

        page.mount_button("copy-png-btn", "Copy as PNG");
        assert!(page.click("copy-png-btn"));
        rx.await.expect("handler ran on the runtime");
    }
}
