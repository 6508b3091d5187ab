//! Chart Viewer Widget
//! Central panel showing the dashboard figure and its copy button.

use crate::charts::{ChartPlotter, Figure};
use crate::export::TRIGGER_ID;
use crate::gui::Page;
use egui::{RichText, ScrollArea};
use std::sync::Arc;

/// Scrollable display of the current figure.
#[derive(Default)]
pub struct ChartViewer {
    pub figure: Option<Arc<Figure>>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.figure = None;
    }

    pub fn set_figure(&mut self, figure: Arc<Figure>) {
        self.figure = Some(figure);
    }

    /// Draw the copy button (when mounted) above the figure.
    pub fn show(&mut self, ui: &mut egui::Ui, page: &Page) {
        let Some(figure) = self.figure.as_ref() else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        if let Some(button) = page.button(TRIGGER_ID) {
            ui.horizontal(|ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let copy = egui::Button::new(RichText::new(format!("📋 {}", button.label)))
                        .min_size(egui::vec2(130.0, 28.0));
                    if ui.add(copy).clicked() {
                        page.click(TRIGGER_ID);
                    }
                });
            });
            ui.add_space(6.0);
        }

        let max_height = ui.available_height();
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ChartPlotter::draw_figure(ui, figure, max_height);
            });
    }
}
