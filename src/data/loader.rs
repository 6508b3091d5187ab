//! Sensor CSV Loader Module
//! Discovers per-device recordings and loads them using Polars.

use crate::data::dataset::{is_sensor_column, Channel, DeviceDataset, Recording};
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static DEVICE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)-").expect("valid device id pattern"));

static SCENARIO_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(.*?\)-\d+.*\.csv$").expect("valid scenario suffix pattern")
});

/// Columns normalised against the control recording when none are configured.
pub const DEFAULT_NORMALIZE_COLUMNS: [&str; 5] = [
    "BME688_R",
    "ENS160_R0",
    "ENS160_R1",
    "ENS160_R2",
    "ENS160_R3",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no timestamp column")]
    MissingTimestamp(PathBuf),
    #[error("Reference {reference} has no column {column}")]
    MissingReferenceColumn { reference: PathBuf, column: String },
    #[error("No data loaded")]
    NoData,
}

/// How a column is brought relative to its reference mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// `value / reference`
    #[default]
    Ratio,
    /// `value - reference`
    Difference,
}

impl Normalization {
    /// Apply to a single value. A zero reference leaves the value unchanged.
    pub fn apply(self, value: f64, reference: f64) -> f64 {
        if reference == 0.0 {
            return value;
        }
        match self {
            Normalization::Ratio => value / reference,
            Normalization::Difference => value - reference,
        }
    }
}

/// Filters applied while listing a device's files.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub first_n: Option<usize>,
    pub skip: Vec<String>,
    pub include: Vec<String>,
}

/// Options for loading against a control recording.
#[derive(Debug, Clone)]
pub struct ReferenceOptions {
    /// Only the last N reference rows form the mean when > 0
    pub take_last_n: usize,
    pub columns: Vec<String>,
    pub normalization: Normalization,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            take_last_n: 0,
            columns: DEFAULT_NORMALIZE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            normalization: Normalization::Ratio,
        }
    }
}

/// Extract the device id from `(DEVICEID)-` in the file name.
///
/// Falls back to the whole file name.
pub fn extract_device_id(path: &Path) -> String {
    let base = base_name(path);
    DEVICE_ID_RE
        .captures(&base)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or(base)
}

/// Extract the scenario label, dropping the device id, date and extension.
pub fn extract_scenario(path: &Path) -> String {
    let base = base_name(path);
    SCENARIO_SUFFIX_RE.replace(&base, "").trim().to_string()
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalPart {
    Text(String),
    Number(u128),
}

/// Sort key where digit runs compare numerically and text case-insensitively.
///
/// Parts always alternate text, number, text, ... starting with text.
fn natural_key(s: &str) -> Vec<NaturalPart> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if !ch.is_ascii_digit() {
            text.push(ch);
            continue;
        }

        let mut digits = ch.to_string();
        while let Some(&next) = chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            digits.push(next);
            chars.next();
        }

        parts.push(NaturalPart::Text(std::mem::take(&mut text).to_lowercase()));
        parts.push(match digits.parse::<u128>() {
            Ok(n) => NaturalPart::Number(n),
            Err(_) => NaturalPart::Text(digits),
        });
    }
    parts.push(NaturalPart::Text(text.to_lowercase()));
    parts
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Loads sensor recordings from CSV files.
pub struct SensorLoader;

impl SensorLoader {
    /// Read a CSV file with Polars.
    pub fn read_frame(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Read one file into a recording.
    ///
    /// The trailing column (`timestamp_s`) is dropped and `relative_time` is
    /// derived from the millisecond `timestamp` column.
    pub fn read_recording(path: &Path) -> Result<Recording, LoaderError> {
        let df = Self::read_frame(path)?;
        let columns = df.get_columns();
        let kept = &columns[..columns.len().saturating_sub(1)];

        let timestamp = kept
            .iter()
            .find(|c| c.name().as_str() == "timestamp")
            .ok_or_else(|| LoaderError::MissingTimestamp(path.to_path_buf()))?;
        let timestamps = column_values(timestamp)?;

        let channels = kept
            .iter()
            .filter(|c| is_sensor_column(c.name().as_str()))
            .map(|c| Ok(Channel::new(c.name().to_string(), column_values(c)?)))
            .collect::<Result<Vec<_>, LoaderError>>()?;

        let origin = timestamps.first().copied().unwrap_or(0.0);
        let relative_time = timestamps.iter().map(|t| (t - origin) / 1000.0).collect();

        Ok(Recording {
            scenario: extract_scenario(path),
            timestamps,
            relative_time,
            channels,
        })
    }

    /// List every file in `folder` belonging to `device_id`, in natural order.
    pub fn files_for_device(
        device_id: &str,
        folder: &Path,
        filter: &FileFilter,
    ) -> Result<Vec<PathBuf>, LoaderError> {
        let entries = std::fs::read_dir(folder).map_err(|source| LoaderError::Io {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort_by(|a, b| natural_cmp(a, b));

        let mut matching = Vec::new();
        for name in names {
            if !name.contains(device_id) {
                continue;
            }
            if filter.skip.iter().any(|s| name.contains(s.as_str())) {
                continue;
            }
            if !filter.include.is_empty() && !filter.include.iter().any(|s| name.contains(s.as_str()))
            {
                continue;
            }

            let full_path = folder.join(&name);
            if full_path.is_file() {
                matching.push(full_path);
            }

            if filter.first_n.is_some_and(|n| matching.len() >= n) {
                break;
            }
        }

        tracing::debug!(device_id, count = matching.len(), "matched device files");
        Ok(matching)
    }

    /// Load files for one device without normalisation.
    pub fn load_recordings(files: &[PathBuf]) -> Result<DeviceDataset, LoaderError> {
        let first = files.first().ok_or(LoaderError::NoData)?;
        let mut dataset = DeviceDataset::new(extract_device_id(first));

        for file in files {
            dataset.push_recording(Self::read_recording(file)?);
        }

        tracing::info!(
            device_id = %dataset.device_id,
            files = files.len(),
            rows = dataset.row_count(),
            "loaded recordings"
        );
        Ok(dataset)
    }

    /// Load files for one device, normalising against a control recording.
    pub fn load_with_reference(
        files: &[PathBuf],
        reference: &Path,
        options: &ReferenceOptions,
    ) -> Result<DeviceDataset, LoaderError> {
        if files.is_empty() {
            return Err(LoaderError::NoData);
        }

        let means = Self::reference_means(reference, options)?;
        let mut dataset = DeviceDataset::new(extract_device_id(reference));

        for file in files {
            let mut recording = Self::read_recording(file)?;
            for channel in &mut recording.channels {
                if let Some((_, mean)) = means.iter().find(|(name, _)| *name == channel.name) {
                    for value in &mut channel.values {
                        *value = options.normalization.apply(*value, *mean);
                    }
                }
            }
            dataset.push_recording(recording);
        }

        tracing::info!(
            device_id = %dataset.device_id,
            reference = %reference.display(),
            files = files.len(),
            "loaded recordings against reference"
        );
        Ok(dataset)
    }

    /// Mean of each normalised column over the (optionally trimmed) reference.
    fn reference_means(
        reference: &Path,
        options: &ReferenceOptions,
    ) -> Result<Vec<(String, f64)>, LoaderError> {
        let recording = Self::read_recording(reference)?;
        let start = if options.take_last_n > 0 {
            recording.len().saturating_sub(options.take_last_n)
        } else {
            0
        };

        options
            .columns
            .iter()
            .map(|column| {
                let channel = recording.channel(column).ok_or_else(|| {
                    LoaderError::MissingReferenceColumn {
                        reference: reference.to_path_buf(),
                        column: column.clone(),
                    }
                })?;
                Ok((column.clone(), nan_mean(&channel.values[start..])))
            })
            .collect()
    }
}

fn column_values(column: &Column) -> Result<Vec<f64>, LoaderError> {
    let as_f64 = column.cast(&DataType::Float64)?;
    let values = as_f64
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(values)
}

/// Mean ignoring NaN; NaN when nothing is left.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
