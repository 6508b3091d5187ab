//! Element lookup seam between the export handler and the UI.

use crate::charts::Figure;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Callback attached to a trigger button. Each call yields one click's work.
pub type ClickHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// The rendered chart a click exports.
#[derive(Debug, Clone)]
pub struct ChartSurface {
    pub class_name: String,
    pub figure: Arc<Figure>,
}

impl ChartSurface {
    pub fn new(class_name: impl Into<String>, figure: Arc<Figure>) -> Self {
        Self {
            class_name: class_name.into(),
            figure,
        }
    }
}

/// A clickable element that can carry one click handler.
pub trait TriggerButton: Send + Sync {
    /// Replace the button's click handler.
    fn set_on_click(&self, handler: ClickHandler);
}

/// Lookup of the elements the export flow depends on.
pub trait Document: Send + Sync {
    /// The trigger button with this id, if it is currently present.
    fn trigger(&self, id: &str) -> Option<Arc<dyn TriggerButton>>;

    /// The first surface with `class_name` inside the container `container_id`.
    ///
    /// `None` when either the container or the surface is missing.
    fn chart_surface(&self, container_id: &str, class_name: &str) -> Option<ChartSurface>;
}
