//! Figure Model
//! Backend-neutral description of the dashboard figure: one subplot per
//! device, one line trace per scenario and sensor.

use crate::data::{DataProcessor, DeviceDataset};
use std::collections::HashMap;
use thiserror::Error;

/// Plotly's qualitative palette, assigned to sensors in sorted order.
pub const PALETTE: [[u8; 3]; 10] = [
    [0x63, 0x6E, 0xFA],
    [0xEF, 0x55, 0x3B],
    [0x00, 0xCC, 0x96],
    [0xAB, 0x63, 0xFA],
    [0xFF, 0xA1, 0x5A],
    [0x19, 0xD3, 0xF3],
    [0xFF, 0x66, 0x92],
    [0xB6, 0xE8, 0x80],
    [0xFF, 0x97, 0xFF],
    [0xFE, 0xCB, 0x52],
];

const SCREEN_HEIGHT: f32 = 1200.0;
const MIN_ROW_HEIGHT: f32 = 300.0;

#[derive(Error, Debug, PartialEq)]
pub enum FigureError {
    #[error("Length of titles list must match number of devices ({titles} titles, {devices} devices)")]
    TitleCountMismatch { titles: usize, devices: usize },
}

/// Subplot titles per device.
#[derive(Debug, Clone, Default)]
pub enum Titles {
    /// Use the device id
    #[default]
    Auto,
    /// Explicit titles; unknown devices fall back to their id
    ByDevice(HashMap<String, String>),
    /// One title per device, in dataset order
    List(Vec<String>),
}

impl Titles {
    fn resolve(&self, datasets: &[DeviceDataset]) -> Result<Vec<String>, FigureError> {
        match self {
            Titles::Auto => Ok(datasets.iter().map(|d| d.device_id.clone()).collect()),
            Titles::ByDevice(map) => Ok(datasets
                .iter()
                .map(|d| map.get(&d.device_id).cloned().unwrap_or_else(|| d.device_id.clone()))
                .collect()),
            Titles::List(list) => {
                if list.len() != datasets.len() {
                    return Err(FigureError::TitleCountMismatch {
                        titles: list.len(),
                        devices: datasets.len(),
                    });
                }
                Ok(list.clone())
            }
        }
    }
}

/// A single line series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    /// Sensor name; traces of the same sensor toggle together
    pub legend_group: String,
    pub color: [u8; 3],
    pub points: Vec<[f64; 2]>,
    pub show_legend: bool,
}

/// One device's panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Subplot {
    pub title: String,
    pub device_id: String,
    pub traces: Vec<Trace>,
}

impl Subplot {
    /// Bounds of all finite points as `(x_min, x_max, y_min, y_max)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self
            .traces
            .iter()
            .flat_map(|t| t.points.iter())
            .filter(|p| p[0].is_finite() && p[1].is_finite());

        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }
}

/// The complete dashboard figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub subplots: Vec<Subplot>,
}

impl Figure {
    pub fn is_empty(&self) -> bool {
        self.subplots.is_empty()
    }

    /// Height of each subplot row in logical pixels.
    pub fn row_height(&self) -> f32 {
        match self.subplots.len() {
            0 | 1 => SCREEN_HEIGHT,
            n => MIN_ROW_HEIGHT.max(SCREEN_HEIGHT / n as f32),
        }
    }

    pub fn total_height(&self) -> f32 {
        self.row_height() * self.subplots.len().max(1) as f32
    }
}

/// Scale a color towards black by `factor`, truncating components.
pub fn shade(color: [u8; 3], factor: f64) -> [u8; 3] {
    color.map(|c| (c as f64 * factor) as u8)
}

/// Shade factor for scenario `index` of `count`.
pub fn scenario_factor(index: usize, count: usize) -> f64 {
    0.2 + 0.8 * index as f64 / count.saturating_sub(1).max(1) as f64
}

/// Builds a [`Figure`] from processed datasets.
pub struct FigureBuilder;

impl FigureBuilder {
    pub fn build(
        datasets: &[DeviceDataset],
        titles: &Titles,
        master_title: &str,
    ) -> Result<Figure, FigureError> {
        let titles = titles.resolve(datasets)?;

        let sensor_colors: HashMap<String, [u8; 3]> = DataProcessor::sensor_names(datasets)
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, PALETTE[i % PALETTE.len()]))
            .collect();

        let subplots = datasets
            .iter()
            .zip(titles)
            .enumerate()
            .map(|(row, (dataset, title))| {
                let scenario_count = dataset.recordings.len();
                let mut traces = Vec::new();

                for (scenario_idx, recording) in dataset.recordings.iter().enumerate() {
                    let factor = scenario_factor(scenario_idx, scenario_count);
                    for channel in &recording.channels {
                        let base = sensor_colors
                            .get(&channel.name)
                            .copied()
                            .unwrap_or(PALETTE[0]);
                        traces.push(Trace {
                            name: format!("{} - {}", recording.scenario, channel.name),
                            legend_group: channel.name.clone(),
                            color: shade(base, factor),
                            points: recording
                                .relative_time
                                .iter()
                                .zip(&channel.values)
                                .map(|(&x, &y)| [x, y])
                                .collect(),
                            show_legend: row == 0,
                        });
                    }
                }

                Subplot {
                    title: format!("{} - {}", title, dataset.device_id),
                    device_id: dataset.device_id.clone(),
                    traces,
                }
            })
            .collect();

        Ok(Figure {
            title: master_title.to_string(),
            x_title: "Time (s)".to_string(),
            y_title: "Sensor Value".to_string(),
            subplots,
        })
    }
}
