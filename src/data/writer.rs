//! Referenced CSV Writer
//! Writes one normalised CSV per device and scenario.

use crate::data::dataset::{DeviceDataset, Recording};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Failed to write CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Exports processed datasets back to CSV.
pub struct ReferencedWriter;

impl ReferencedWriter {
    /// File name used for one device/scenario pair.
    pub fn file_name(device_id: &str, scenario: &str) -> String {
        format!("{} ({}).csv", scenario.replace('/', "_"), device_id)
    }

    /// Write every scenario of every dataset into `output_dir`.
    ///
    /// Returns the written paths in order.
    pub fn write_all(
        datasets: &[DeviceDataset],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, WriterError> {
        fs::create_dir_all(output_dir).map_err(|source| WriterError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::new();
        for dataset in datasets {
            for recording in &dataset.recordings {
                if recording.is_empty() {
                    tracing::warn!(
                        device = %dataset.device_id,
                        scenario = %recording.scenario,
                        "no rows left, skipping referenced csv"
                    );
                    continue;
                }
                let path = output_dir.join(Self::file_name(&dataset.device_id, &recording.scenario));
                let mut df = Self::to_frame(recording)?;
                let mut file = File::create(&path).map_err(|source| WriterError::Io {
                    path: path.clone(),
                    source,
                })?;
                CsvWriter::new(&mut file).finish(&mut df)?;

                tracing::info!(path = %path.display(), rows = df.height(), "saved referenced csv");
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Columns: `timestamp`, sensor channels, `timestamp_s` (relative seconds).
    fn to_frame(recording: &Recording) -> Result<DataFrame, WriterError> {
        let mut columns = vec![Column::new("timestamp".into(), recording.timestamps.clone())];
        for channel in &recording.channels {
            columns.push(Column::new(
                channel.name.as_str().into(),
                channel.values.clone(),
            ));
        }
        columns.push(Column::new(
            "timestamp_s".into(),
            recording.relative_time.clone(),
        ));
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Channel;
    use crate::data::loader::SensorLoader;

    #[test]
    fn scenario_slashes_are_sanitised() {
        assert_eq!(
            ReferencedWriter::file_name("DEV1", "Lure 1/2"),
            "Lure 1_2 (DEV1).csv"
        );
    }

    #[test]
    fn written_files_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = DeviceDataset::new("DEV1");
        dataset.push_recording(Recording {
            scenario: "Lure".to_string(),
            timestamps: vec![1000.0, 2000.0],
            relative_time: vec![0.0, 1.0],
            channels: vec![Channel::new("ENS160_R0", vec![0.5, 0.75])],
        });

        let out = dir.path().join("referenced");
        let paths = ReferencedWriter::write_all(&[dataset], &out).unwrap();
        assert_eq!(paths, vec![out.join("Lure (DEV1).csv")]);

        let df = SensorLoader::read_frame(&paths[0]).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["timestamp", "ENS160_R0", "timestamp_s"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn empty_scenarios_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = DeviceDataset::new("DEV1");
        dataset.push_recording(Recording {
            scenario: "Control".to_string(),
            timestamps: Vec::new(),
            relative_time: Vec::new(),
            channels: vec![Channel::new("ENS160_R0", Vec::new())],
        });
        dataset.push_recording(Recording {
            scenario: "Lure".to_string(),
            timestamps: vec![1000.0],
            relative_time: vec![0.0],
            channels: vec![Channel::new("ENS160_R0", vec![0.5])],
        });

        let paths = ReferencedWriter::write_all(&[dataset], dir.path()).unwrap();
        assert_eq!(paths, vec![dir.path().join("Lure (DEV1).csv")]);
        assert!(!dir.path().join("Control (DEV1).csv").exists());
    }
}
