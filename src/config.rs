//! Pipeline Configuration
//! JSON description of which devices to load and how to process them.

use crate::data::{Normalization, DEFAULT_NORMALIZE_COLUMNS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Config lists no devices")]
    NoDevices,
}

/// One device to plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    /// Subplot title; the device id is used when absent
    #[serde(default)]
    pub title: Option<String>,
}

/// Full processing pipeline description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub title: String,
    pub folder: PathBuf,
    pub devices: Vec<DeviceConfig>,
    /// Normalise test files against the device's control recording
    pub normalize: bool,
    /// File name marker identifying control recordings
    pub control_marker: String,
    /// Number of control files considered; the last one is the reference
    pub control_first_n: usize,
    /// Reference rows averaged (from the end); 0 uses all rows
    pub reference_last_n: usize,
    pub normalization: Normalization,
    pub normalize_columns: Vec<String>,
    /// Sensor channels containing any of these substrings are dropped
    pub drop_columns: Vec<String>,
    /// Channels left out of the referenced CSV export
    pub export_drop_columns: Vec<String>,
    /// Rows kept per scenario; 0 keeps everything
    pub last_n_samples: usize,
    /// Moving average window; 1 or less disables smoothing
    pub moving_average_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Sensor Comparison Dashboard".to_string(),
            folder: PathBuf::from("."),
            devices: Vec::new(),
            normalize: true,
            control_marker: "EMPTY PETRI DISH".to_string(),
            control_first_n: 5,
            reference_last_n: 10,
            normalization: Normalization::Ratio,
            normalize_columns: DEFAULT_NORMALIZE_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            drop_columns: vec!["BME688".to_string(), "SGP41".to_string(), "_R1".to_string()],
            export_drop_columns: vec!["_R1".to_string()],
            last_n_samples: 25,
            moving_average_window: 5,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file.
    ///
    /// A relative `folder` is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.folder.is_relative() {
            if let Some(parent) = path.parent() {
                config.folder = parent.join(&config.folder);
            }
        }

        config.validate()?;
        tracing::info!(
            path = %path.display(),
            devices = config.devices.len(),
            "loaded pipeline config"
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        Ok(())
    }
}
