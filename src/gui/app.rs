//! Sensor Dash Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{Figure, FigureBuilder, Titles};
use crate::config::PipelineConfig;
use crate::data::ReferencedWriter;
use crate::export::{
    spawn_copy_button_setup, ChartSurface, CopyPngHandler, DataUriFetcher, PlottersImageRenderer,
    SystemClipboard, CONTAINER_ID, SURFACE_CLASS, TRIGGER_ID,
};
use crate::gui::{AlertModal, AlertQueue, ChartViewer, ControlPanel, ControlPanelAction, Page};
use crate::pipeline::Pipeline;
use egui::SidePanel;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tokio::runtime::Handle;

/// Pipeline result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete {
        config: PipelineConfig,
        figure: Figure,
    },
    Error(String),
}

/// Main application window.
pub struct SensorDashApp {
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    page: Arc<Page>,
    alerts: AlertModal,
    config: Option<PipelineConfig>,

    // Async pipeline loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl SensorDashApp {
    /// Build the window and start waiting for the copy button.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: Handle,
        config_path: Option<PathBuf>,
    ) -> Self {
        let (alert_queue, alerts) = AlertQueue::new();
        let alert_queue = alert_queue.with_repaint(cc.egui_ctx.clone());
        let page = Arc::new(Page::new(runtime.clone()));

        let handler = CopyPngHandler::new(
            page.clone(),
            Arc::new(PlottersImageRenderer),
            Arc::new(DataUriFetcher),
            Arc::new(SystemClipboard::spawn()),
            Arc::new(alert_queue),
        );
        spawn_copy_button_setup(&runtime, page.clone(), Arc::new(handler));

        let mut app = Self {
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            page,
            alerts,
            config: None,
            load_rx: None,
            is_loading: false,
        };

        if let Some(path) = config_path {
            app.control_panel.config_path = Some(path);
            app.start_loading();
        }
        app
    }

    fn handle_browse_config(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Pipeline Config", &["json"])
            .pick_file()
        {
            self.control_panel.config_path = Some(path);
            self.control_panel.set_progress(0.0, "Config selected");
        }
    }

    /// Run the pipeline in a background thread
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(path) = self.control_panel.config_path.clone() else {
            self.control_panel.set_progress(0.0, "No config selected");
            return;
        };

        self.chart_viewer.clear();
        self.config = None;
        self.page.unmount_chart(CONTAINER_ID);
        self.control_panel.export_enabled = false;
        self.control_panel.set_progress(5.0, "Reading config...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || Self::run_pipeline(tx, &path));
    }

    /// Run the pipeline (called from background thread)
    fn run_pipeline(tx: Sender<LoadResult>, path: &Path) {
        let config = match PipelineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(LoadResult::Progress(
            20.0,
            format!("Loading {} devices...", config.devices.len()),
        ));
        let datasets = match Pipeline::run(&config) {
            Ok(datasets) => datasets,
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(LoadResult::Progress(80.0, "Building figure...".to_string()));
        let titles = Titles::ByDevice(Pipeline::device_titles(&config));
        match FigureBuilder::build(&datasets, &titles, &config.title) {
            Ok(figure) => {
                let _ = tx.send(LoadResult::Complete { config, figure });
            }
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        }
    }

    /// Check for pipeline results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        while let Ok(result) = rx.try_recv() {
            match result {
                LoadResult::Progress(progress, status) => {
                    self.control_panel.set_progress(progress, &status);
                }
                LoadResult::Complete { config, figure } => {
                    let figure = Arc::new(figure);
                    self.control_panel.set_progress(
                        100.0,
                        &format!("Complete! {} devices plotted", figure.subplots.len()),
                    );
                    self.mount_figure(Arc::clone(&figure));
                    self.chart_viewer.set_figure(figure);
                    self.config = Some(config);
                    self.control_panel.export_enabled = true;
                    self.is_loading = false;
                    should_keep_receiver = false;
                }
                LoadResult::Error(error) => {
                    tracing::error!(%error, "pipeline failed");
                    self.control_panel
                        .set_progress(0.0, &format!("Error: {}", error));
                    self.is_loading = false;
                    should_keep_receiver = false;
                }
            }
        }

        if should_keep_receiver {
            self.load_rx = Some(rx);
        }
    }

    /// Put the chart and its copy button on the page.
    fn mount_figure(&self, figure: Arc<Figure>) {
        self.page
            .mount_chart(CONTAINER_ID, ChartSurface::new(SURFACE_CLASS, figure));
        self.page.mount_button(TRIGGER_ID, "Copy as PNG");
    }

    /// Export the referenced CSVs, re-run without smoothing.
    fn handle_export_csv(&mut self) {
        let Some(config) = self.config.as_ref() else {
            self.control_panel.set_progress(0.0, "No data to export");
            return;
        };
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let written = Pipeline::run_referenced(config)
            .map_err(|e| e.to_string())
            .and_then(|datasets| {
                ReferencedWriter::write_all(&datasets, &dir).map_err(|e| e.to_string())
            });
        match written {
            Ok(paths) => self.control_panel.set_progress(
                100.0,
                &format!("Complete! {} CSV files written", paths.len()),
            ),
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: {}", e)),
        }
    }
}

impl eframe::App for SensorDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui, self.is_loading) {
                        ControlPanelAction::BrowseConfig => self.handle_browse_config(),
                        ControlPanelAction::Load => self.start_loading(),
                        ControlPanelAction::ExportCsv => self.handle_export_csv(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, &self.page);
        });

        self.alerts.show(ctx);
    }
}
