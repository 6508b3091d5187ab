//! Sensor Dash - sensor recording dashboard with clipboard PNG export
//!
//! Loads per-device sensor CSV recordings, normalises them against control
//! runs and shows one subplot per device. The chart can be copied to the
//! clipboard as an 800x600 PNG.

mod charts;
mod config;
mod data;
mod export;
mod gui;
mod pipeline;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use std::path::{Path, PathBuf};

use charts::{FigureBuilder, StaticChartRenderer, Titles};
use config::PipelineConfig;
use data::{FolderBatch, ReferencedWriter, DEFAULT_SPLIT_ROWS};
use export::{EXPORT_HEIGHT, EXPORT_WIDTH};
use gui::SensorDashApp;
use pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "sensor_dash", version, about = "Sensor recording dashboard")]
struct Args {
    /// Pipeline config (JSON) to load on startup
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write referenced CSV files into this directory and exit
    #[arg(long, value_name = "DIR", requires = "config")]
    export_referenced: Option<PathBuf>,

    /// Render the dashboard to this PNG file and exit
    #[arg(long, value_name = "FILE", requires = "config")]
    png: Option<PathBuf>,

    /// Add an integer `timestamp_s` column to every CSV in DIR and exit
    #[arg(long, value_name = "DIR")]
    add_seconds: Option<PathBuf>,

    /// Keep the last rows of every CSV in DIR, with a leading index, and exit
    #[arg(long, value_name = "DIR")]
    split_and_index: Option<PathBuf>,

    /// Rows kept by --split-and-index
    #[arg(long, default_value_t = DEFAULT_SPLIT_ROWS)]
    split_rows: usize,
}

impl Args {
    fn is_headless(&self) -> bool {
        self.export_referenced.is_some()
            || self.png.is_some()
            || self.add_seconds.is_some()
            || self.split_and_index.is_some()
    }
}

fn main() -> Result<()> {
    telemetry::init_tracing();
    let args = Args::parse();

    if args.is_headless() {
        return run_headless(&args);
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let handle = runtime.handle().clone();
    let config_path = args.config;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Sensor Dash"),
        ..Default::default()
    };

    eframe::run_native(
        "Sensor Dash",
        options,
        Box::new(move |cc| Ok(Box::new(SensorDashApp::new(cc, handle, config_path)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}

fn run_headless(args: &Args) -> Result<()> {
    if let Some(dir) = &args.add_seconds {
        FolderBatch::add_seconds(dir)?;
    }
    if let Some(dir) = &args.split_and_index {
        FolderBatch::split_and_index(dir, args.split_rows)?;
    }
    if args.export_referenced.is_none() && args.png.is_none() {
        return Ok(());
    }

    let config_path = args
        .config
        .as_deref()
        .context("--config is required in headless mode")?;
    let config = PipelineConfig::load(config_path)?;

    if let Some(dir) = &args.export_referenced {
        let datasets = Pipeline::run_referenced(&config)?;
        let written = ReferencedWriter::write_all(&datasets, dir)?;
        tracing::info!(files = written.len(), dir = %dir.display(), "exported referenced CSV");
    }

    if let Some(path) = &args.png {
        let datasets = Pipeline::run(&config)?;
        let titles = Titles::ByDevice(Pipeline::device_titles(&config));
        let figure = FigureBuilder::build(&datasets, &titles, &config.title)?;
        let png = StaticChartRenderer::render_png(&figure, EXPORT_WIDTH, EXPORT_HEIGHT)?;
        write_png(path, &png)?;
    }
    Ok(())
}

fn write_png(path: &Path, png: &[u8]) -> Result<()> {
    std::fs::write(path, png).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = png.len(), "wrote chart PNG");
    Ok(())
}
