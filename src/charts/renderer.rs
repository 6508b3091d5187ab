//! Static Chart Renderer
//! Renders a [`Figure`] to PNG bytes with plotters.
//!
//! Layout:
//! 1. Master title centered at the top
//! 2. One panel per device, stacked vertically, sharing the time axis label
//! 3. Legend (sensor/scenario traces) on the first panel only

use crate::charts::figure::{Figure, Subplot};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;
use thiserror::Error;

const TITLE_FONT_SIZE: f64 = 22.0;
const CAPTION_FONT_SIZE: f64 = 15.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid image size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Nothing to render")]
    EmptyFigure,
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Pixel buffer does not match image size")]
    Buffer,
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the whole figure into an in-memory PNG.
    pub fn render_png(figure: &Figure, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        if figure.is_empty() {
            return Err(RenderError::EmptyFigure);
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::draw_figure(&root, figure)?;
            root.present().map_err(draw_err)?;
        }

        let image = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        tracing::debug!(width, height, bytes = png.len(), "rendered figure to png");
        Ok(png)
    }

    fn draw_figure(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        figure: &Figure,
    ) -> Result<(), RenderError> {
        root.fill(&WHITE).map_err(draw_err)?;
        let body = root
            .titled(&figure.title, ("sans-serif", TITLE_FONT_SIZE))
            .map_err(draw_err)?;

        let panels = body.split_evenly((figure.subplots.len(), 1));
        for (panel, subplot) in panels.iter().zip(&figure.subplots) {
            Self::draw_subplot(panel, figure, subplot)?;
        }
        Ok(())
    }

    fn draw_subplot(
        panel: &DrawingArea<BitMapBackend<'_>, Shift>,
        figure: &Figure,
        subplot: &Subplot,
    ) -> Result<(), RenderError> {
        let (x_range, y_range) = Self::axis_ranges(subplot);

        let mut chart = ChartBuilder::on(panel)
            .caption(&subplot.title, ("sans-serif", CAPTION_FONT_SIZE))
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(55)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc(figure.x_title.as_str())
            .y_desc(figure.y_title.as_str())
            .draw()
            .map_err(draw_err)?;

        for trace in &subplot.traces {
            let color = RGBColor(trace.color[0], trace.color[1], trace.color[2]);
            let points = trace
                .points
                .iter()
                .filter(|p| p[0].is_finite() && p[1].is_finite())
                .map(|p| (p[0], p[1]));

            let series = chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(draw_err)?;
            if trace.show_legend {
                series.label(trace.name.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
            }
        }

        if subplot.traces.iter().any(|t| t.show_legend) {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8).filled())
                .border_style(BLACK.stroke_width(1))
                .draw()
                .map_err(draw_err)?;
        }

        Ok(())
    }

    /// Axis ranges padded so flat or empty data still yields a valid plot.
    fn axis_ranges(subplot: &Subplot) -> (Range<f64>, Range<f64>) {
        let (x_min, x_max, y_min, y_max) = subplot.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
        (pad(x_min, x_max, 0.0), pad(y_min, y_max, 0.05))
    }
}

fn pad(min: f64, max: f64, fraction: f64) -> Range<f64> {
    let span = max - min;
    if span <= f64::EPSILON {
        let half = if min == 0.0 { 0.5 } else { min.abs() * 0.05 };
        return (min - half)..(max + half);
    }
    let margin = span * fraction;
    (min - margin)..(max + margin)
}
