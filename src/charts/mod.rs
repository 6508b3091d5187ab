//! Charts module - Figure model, interactive and static rendering

mod figure;
mod plotter;
mod renderer;

pub use figure::{Figure, FigureBuilder, Titles};
pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;
