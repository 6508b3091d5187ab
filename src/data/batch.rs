//! Folder Batch Tools
//! Whole-folder CSV rewrites: relative seconds column, last-N split with index.

use crate::data::loader::{LoaderError, SensorLoader};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rows kept per file by [`FolderBatch::split_and_index`] unless told otherwise.
pub const DEFAULT_SPLIT_ROWS: usize = 30;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No timestamp column in {0}")]
    MissingTimestamp(PathBuf),
}

/// Rewrites every CSV of a folder into a sibling output folder.
pub struct FolderBatch;

impl FolderBatch {
    /// Add (or replace) an integer `timestamp_s` column holding whole seconds
    /// since the first row: `(timestamp - first) / 1000`, truncated.
    ///
    /// Output goes to `"<folder> - normalised seconds"`.
    pub fn add_seconds(input: &Path) -> Result<Vec<PathBuf>, BatchError> {
        let output = Self::sibling(input, "normalised seconds");
        Self::rewrite_all(input, &output, |path, df| {
            if df.column("timestamp").is_err() {
                return Err(BatchError::MissingTimestamp(path.to_path_buf()));
            }
            let ms = col("timestamp").cast(DataType::Float64);
            df.lazy()
                .with_column(
                    ((ms.clone() - ms.first()) / lit(1000.0))
                        .cast(DataType::Int64)
                        .alias("timestamp_s"),
                )
                .collect()
                .map_err(|source| BatchError::Csv {
                    path: path.to_path_buf(),
                    source,
                })
        })
    }

    /// Keep the last `rows` rows, drop the trailing column and prepend a
    /// 1-based `index` column.
    ///
    /// Output goes to `"<folder> - split and indexed"`.
    pub fn split_and_index(input: &Path, rows: usize) -> Result<Vec<PathBuf>, BatchError> {
        let output = Self::sibling(input, "split and indexed");
        Self::rewrite_all(input, &output, |path, df| {
            let csv_err = |source| BatchError::Csv {
                path: path.to_path_buf(),
                source,
            };
            let mut df = df.tail(Some(rows));
            if let Some(last) = df.get_column_names().last().map(|n| n.to_string()) {
                df = df.drop(&last).map_err(csv_err)?;
            }
            let index: Vec<i64> = (1..=df.height() as i64).collect();
            df.insert_column(0, Column::new("index".into(), index))
                .map_err(csv_err)?;
            Ok(df)
        })
    }

    /// `<parent>/<name> - <suffix>` next to `input`.
    fn sibling(input: &Path, suffix: &str) -> PathBuf {
        match input.file_name() {
            Some(name) => {
                input.with_file_name(format!("{} - {}", name.to_string_lossy(), suffix))
            }
            None => PathBuf::from(format!("{} - {}", input.display(), suffix)),
        }
    }

    /// CSV files directly inside `input`, sorted by name.
    fn csv_files(input: &Path) -> Result<Vec<PathBuf>, BatchError> {
        let entries = fs::read_dir(input).map_err(|source| BatchError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        files.sort();
        Ok(files)
    }

    fn rewrite_all<F>(input: &Path, output: &Path, transform: F) -> Result<Vec<PathBuf>, BatchError>
    where
        F: Fn(&Path, DataFrame) -> Result<DataFrame, BatchError>,
    {
        let files = Self::csv_files(input)?;
        fs::create_dir_all(output).map_err(|source| BatchError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(files.len());
        for path in files {
            let df = SensorLoader::read_frame(&path)?;
            let mut df = transform(&path, df)?;

            let Some(name) = path.file_name() else {
                continue;
            };
            let target = output.join(name);
            let mut file = File::create(&target).map_err(|source| BatchError::Io {
                path: target.clone(),
                source,
            })?;
            CsvWriter::new(&mut file)
                .finish(&mut df)
                .map_err(|source| BatchError::Csv {
                    path: target.clone(),
                    source,
                })?;
            written.push(target);
        }

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            files = written.len(),
            "rewrote folder"
        );
        Ok(written)
    }
}
