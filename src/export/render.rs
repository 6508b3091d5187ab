//! Chart-to-image capability.

use crate::charts::StaticChartRenderer;
use crate::export::{encode_data_uri, ChartSurface, ExportError, PNG_MIME};
use async_trait::async_trait;
use std::sync::Arc;

/// Encoded image formats a renderer can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
}

impl ImageKind {
    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Png => PNG_MIME,
        }
    }
}

/// Requested output of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub format: ImageKind,
    pub width: u32,
    pub height: u32,
}

impl ImageOptions {
    pub fn png(width: u32, height: u32) -> Self {
        Self {
            format: ImageKind::Png,
            width,
            height,
        }
    }
}

/// Renders a chart surface to an encoded image reference (a `data:` URI).
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn to_image(
        &self,
        surface: &ChartSurface,
        options: ImageOptions,
    ) -> Result<String, ExportError>;
}

/// Renders the surface's figure with plotters on a blocking thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlottersImageRenderer;

#[async_trait]
impl ImageRenderer for PlottersImageRenderer {
    async fn to_image(
        &self,
        surface: &ChartSurface,
        options: ImageOptions,
    ) -> Result<String, ExportError> {
        let figure = Arc::clone(&surface.figure);
        let png = tokio::task::spawn_blocking(move || {
            StaticChartRenderer::render_png(&figure, options.width, options.height)
        })
        .await
        .map_err(|e| ExportError::Render(e.to_string()))?
        .map_err(|e| ExportError::Render(e.to_string()))?;

        Ok(encode_data_uri(options.format.mime(), &png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Figure, FigureBuilder, Titles};
    use crate::data::{Channel, DeviceDataset, Recording};
    use crate::export::{DataUriFetcher, Fetcher, EXPORT_HEIGHT, EXPORT_WIDTH};

    fn one_device_figure() -> Figure {
        let mut dataset = DeviceDataset::new("94A99037CBDC");
        dataset.push_recording(Recording {
            scenario: "Lure".to_string(),
            timestamps: vec![0.0, 1000.0, 2000.0, 3000.0],
            relative_time: vec![0.0, 1.0, 2.0, 3.0],
            channels: vec![
                Channel::new("ENS160_R0", vec![1.0, 1.2, 0.9, 1.1]),
                Channel::new("ENS160_R2", vec![0.8, 0.85, 0.95, 1.0]),
            ],
        });
        FigureBuilder::build(&[dataset], &Titles::Auto, "Sensor Comparison Dashboard").unwrap()
    }

    #[tokio::test]
    async fn rendered_chart_resolves_to_an_800x600_png_blob() {
        let surface = ChartSurface::new("js-plotly-plot", Arc::new(one_device_figure()));

        let uri = PlottersImageRenderer
            .to_image(&surface, ImageOptions::png(EXPORT_WIDTH, EXPORT_HEIGHT))
            .await
            .unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let blob = DataUriFetcher.fetch(&uri).await.unwrap().blob().await;
        assert_eq!(blob.mime, "image/png");

        let decoded = image::load_from_memory_with_format(&blob.bytes, image::ImageFormat::Png)
            .unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[tokio::test]
    async fn render_errors_surface_as_export_errors() {
        let surface = ChartSurface::new(
            "js-plotly-plot",
            Arc::new(Figure {
                title: "empty".into(),
                x_title: "x".into(),
                y_title: "y".into(),
                subplots: vec![],
            }),
        );

        let err = PlottersImageRenderer
            .to_image(&surface, ImageOptions::png(800, 600))
            .await
            .unwrap_err();
        assert_eq!(err, ExportError::Render("Nothing to render".to_string()));
    }
}
