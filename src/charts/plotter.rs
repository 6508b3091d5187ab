//! Chart Plotter Module
//! Interactive figure display using egui_plot.

use crate::charts::figure::{Figure, Subplot};
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotPoints};

/// Draws a [`Figure`] as stacked interactive plots.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn to_color32(rgb: [u8; 3]) -> Color32 {
        Color32::from_rgb(rgb[0], rgb[1], rgb[2])
    }

    /// Draw every subplot of the figure, one under another.
    ///
    /// `max_height` bounds the total height so the figure fits the viewer.
    pub fn draw_figure(ui: &mut egui::Ui, figure: &Figure, max_height: f32) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(&figure.title).size(18.0).strong());
        });
        ui.add_space(6.0);

        let scale = (max_height / figure.total_height()).min(1.0);
        let row_height = (figure.row_height() * scale).max(160.0);

        for (row, subplot) in figure.subplots.iter().enumerate() {
            Self::draw_subplot(ui, figure, subplot, row, row_height);
            ui.add_space(4.0);
        }
    }

    fn draw_subplot(
        ui: &mut egui::Ui,
        figure: &Figure,
        subplot: &Subplot,
        row: usize,
        height: f32,
    ) {
        ui.label(RichText::new(&subplot.title).size(13.0));

        let mut plot = Plot::new(format!("subplot_{}_{}", row, subplot.device_id))
            .height(height)
            .allow_scroll(false)
            .link_axis("dashboard_x", [true, false])
            .y_axis_label(figure.y_title.clone());
        if row + 1 == figure.subplots.len() {
            plot = plot.x_axis_label(figure.x_title.clone());
        }
        if subplot.traces.iter().any(|t| t.show_legend) {
            plot = plot.legend(Legend::default());
        }

        plot.show(ui, |plot_ui| {
            for trace in &subplot.traces {
                let points: PlotPoints = trace
                    .points
                    .iter()
                    .filter(|p| p[0].is_finite() && p[1].is_finite())
                    .copied()
                    .collect();

                let mut line = Line::new(points)
                    .color(Self::to_color32(trace.color))
                    .width(1.5);
                if trace.show_legend {
                    line = line.name(&trace.name);
                }
                plot_ui.line(line);
            }
        });
    }
}
