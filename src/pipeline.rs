//! Processing Pipeline
//! Turns a pipeline config into processed per-device datasets.

use crate::config::{DeviceConfig, PipelineConfig};
use crate::data::{
    DataProcessor, DeviceDataset, FileFilter, LoaderError, ReferenceOptions, SensorLoader,
};
use rayon::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("No control files found for device {0}")]
    NoControlFiles(String),
    #[error("No data files found for device {0}")]
    NoDataFiles(String),
}

/// Runs the configured load/normalise/smooth steps for every device.
pub struct Pipeline;

impl Pipeline {
    /// Datasets as plotted: dashboard drop list, last N samples, smoothing.
    ///
    /// Devices are processed in parallel; the configured order is kept.
    pub fn run(config: &PipelineConfig) -> Result<Vec<DeviceDataset>, PipelineError> {
        config
            .devices
            .par_iter()
            .map(|device| {
                let mut dataset = Self::load_device(config, device)?;
                DataProcessor::drop_columns(&mut dataset, &config.drop_columns);
                Self::trim(config, &mut dataset);
                if config.moving_average_window > 1 {
                    DataProcessor::moving_average(&mut dataset, config.moving_average_window);
                }
                Self::log_processed(&dataset, "processed device");
                Ok(dataset)
            })
            .collect()
    }

    /// Datasets for the referenced CSV export: normalised and trimmed to the
    /// last N samples, never smoothed, with only the export drop list applied.
    pub fn run_referenced(config: &PipelineConfig) -> Result<Vec<DeviceDataset>, PipelineError> {
        config
            .devices
            .par_iter()
            .map(|device| {
                let mut dataset = Self::load_device(config, device)?;
                DataProcessor::drop_columns(&mut dataset, &config.export_drop_columns);
                Self::trim(config, &mut dataset);
                Self::log_processed(&dataset, "prepared device for export");
                Ok(dataset)
            })
            .collect()
    }

    fn load_device(
        config: &PipelineConfig,
        device: &DeviceConfig,
    ) -> Result<DeviceDataset, PipelineError> {
        if config.normalize {
            return Self::load_normalized(config, &device.id);
        }
        let files =
            SensorLoader::files_for_device(&device.id, &config.folder, &FileFilter::default())?;
        if files.is_empty() {
            return Err(PipelineError::NoDataFiles(device.id.clone()));
        }
        Ok(SensorLoader::load_recordings(&files)?)
    }

    fn trim(config: &PipelineConfig, dataset: &mut DeviceDataset) {
        if config.last_n_samples > 0 {
            DataProcessor::take_last_n(dataset, config.last_n_samples);
        }
    }

    fn log_processed(dataset: &DeviceDataset, message: &str) {
        tracing::info!(
            device_id = %dataset.device_id,
            scenarios = ?dataset.scenarios(),
            channels = dataset.channel_names().len(),
            rows = dataset.row_count(),
            "{}",
            message
        );
    }

    /// Use the last of the first N control recordings as the reference for
    /// every non-control file.
    fn load_normalized(
        config: &PipelineConfig,
        device_id: &str,
    ) -> Result<DeviceDataset, PipelineError> {
        let controls = SensorLoader::files_for_device(
            device_id,
            &config.folder,
            &FileFilter {
                first_n: Some(config.control_first_n),
                include: vec![config.control_marker.clone()],
                ..Default::default()
            },
        )?;
        let reference = controls
            .last()
            .ok_or_else(|| PipelineError::NoControlFiles(device_id.to_string()))?;

        let tests = SensorLoader::files_for_device(
            device_id,
            &config.folder,
            &FileFilter {
                skip: vec![config.control_marker.clone()],
                ..Default::default()
            },
        )?;
        if tests.is_empty() {
            return Err(PipelineError::NoDataFiles(device_id.to_string()));
        }

        let options = ReferenceOptions {
            take_last_n: config.reference_last_n,
            columns: config.normalize_columns.clone(),
            normalization: config.normalization,
        };
        Ok(SensorLoader::load_with_reference(&tests, reference, &options)?)
    }

    /// Subplot titles keyed by device id, from the config.
    pub fn device_titles(config: &PipelineConfig) -> HashMap<String, String> {
        config
            .devices
            .iter()
            .filter_map(|d| d.title.clone().map(|t| (d.id.clone(), t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferencedWriter;
    use std::fs;
    use std::path::Path;

    const HEADER: &str = "timestamp,BME688_R,ENS160_R0,ENS160_R1,ENS160_R2,ENS160_R3,timestamp_s\n";

    fn write(dir: &Path, name: &str, rows: usize, value: f64) {
        let mut body = HEADER.to_string();
        for i in 0..rows {
            body.push_str(&format!(
                "{},{v},{v},{v},{v},{v},0\n",
                i * 1000,
                v = value
            ));
        }
        fs::write(dir.join(name), body).unwrap();
    }

    fn write_values(dir: &Path, name: &str, values: &[f64]) {
        let mut body = HEADER.to_string();
        for (i, v) in values.iter().enumerate() {
            body.push_str(&format!("{},{v},{v},{v},{v},{v},0\n", i * 1000));
        }
        fs::write(dir.join(name), body).unwrap();
    }

    fn config(folder: &Path) -> PipelineConfig {
        PipelineConfig {
            folder: folder.to_path_buf(),
            devices: vec![DeviceConfig {
                id: "DEV1".to_string(),
                title: Some("Device 1".to_string()),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn normalised_run_uses_last_control_as_reference() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Exposure 1 -EMPTY PETRI DISH (DEV1)-20250813_1.csv", 3, 8.0);
        write(dir.path(), "Exposure 2 -EMPTY PETRI DISH (DEV1)-20250813_2.csv", 3, 2.0);
        write(dir.path(), "Exposure 3 -Lure (DEV1)-20250813_3.csv", 40, 4.0);

        let datasets = Pipeline::run(&config(dir.path())).unwrap();
        assert_eq!(datasets.len(), 1);

        let dataset = &datasets[0];
        assert_eq!(dataset.device_id, "DEV1");
        assert_eq!(dataset.scenarios(), vec!["Exposure 3 -Lure"]);
        // BME688, SGP41 and _R1 channels are dropped by default
        assert_eq!(
            dataset.channel_names(),
            vec!["ENS160_R0", "ENS160_R2", "ENS160_R3"]
        );
        let recording = &dataset.recordings[0];
        assert_eq!(recording.len(), 25);
        assert!(recording
            .channel("ENS160_R0")
            .unwrap()
            .values
            .iter()
            .all(|v| (*v - 2.0).abs() < 1e-9));
    }

    #[test]
    fn missing_controls_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Lure (DEV1)-20250813_3.csv", 2, 4.0);

        let err = Pipeline::run(&config(dir.path())).unwrap_err();
        assert_eq!(err.to_string(), "No control files found for device DEV1");
    }

    #[test]
    fn unnormalised_run_loads_every_device_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Background (DEV1)-20250813_1.csv", 2, 4.0);
        write(dir.path(), "Lure (DEV1)-20250813_2.csv", 2, 6.0);

        let mut config = config(dir.path());
        config.normalize = false;
        config.moving_average_window = 1;

        let datasets = Pipeline::run(&config).unwrap();
        assert_eq!(datasets[0].scenarios(), vec!["Background", "Lure"]);
        assert_eq!(
            datasets[0].recordings[1].channel("ENS160_R0").unwrap().values,
            vec![6.0, 6.0]
        );
    }

    #[test]
    fn referenced_export_is_unsmoothed_and_keeps_bme688() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Exposure 1 -EMPTY PETRI DISH (DEV1)-20250813_1.csv", 3, 2.0);
        write_values(
            dir.path(),
            "Exposure 2 -Lure (DEV1)-20250813_2.csv",
            &[0.0, 0.0, 20.0, 20.0],
        );
        let config = config(dir.path());

        let plotted = Pipeline::run(&config).unwrap();
        let smoothed = &plotted[0].recordings[0].channel("ENS160_R0").unwrap().values;
        assert!((smoothed[2] - 10.0 / 3.0).abs() < 1e-9);

        let referenced = Pipeline::run_referenced(&config).unwrap();
        let dataset = &referenced[0];
        assert_eq!(
            dataset.channel_names(),
            vec!["BME688_R", "ENS160_R0", "ENS160_R2", "ENS160_R3"]
        );
        assert_eq!(
            dataset.recordings[0].channel("ENS160_R0").unwrap().values,
            vec![0.0, 0.0, 10.0, 10.0]
        );

        let out = dir.path().join("referenced");
        let paths = ReferencedWriter::write_all(&referenced, &out).unwrap();
        let df = SensorLoader::read_frame(&paths[0]).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["timestamp", "BME688_R", "ENS160_R0", "ENS160_R2", "ENS160_R3", "timestamp_s"]
        );
    }

    #[test]
    fn titles_come_from_device_entries() {
        let titles = Pipeline::device_titles(&config(Path::new(".")));
        assert_eq!(titles.get("DEV1").map(String::as_str), Some("Device 1"));
    }
}
