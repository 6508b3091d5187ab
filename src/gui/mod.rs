//! GUI module - User interface components

mod alerts;
mod app;
mod chart_viewer;
mod control_panel;
mod page;

pub use alerts::{AlertModal, AlertQueue};
pub use app::SensorDashApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use page::Page;
