//! Data module - Sensor CSV loading, processing and export

mod batch;
mod dataset;
mod loader;
mod processor;
mod writer;

pub use batch::{FolderBatch, DEFAULT_SPLIT_ROWS};
pub use dataset::{Channel, DeviceDataset, Recording};
pub use loader::{
    FileFilter, LoaderError, Normalization, ReferenceOptions, SensorLoader,
    DEFAULT_NORMALIZE_COLUMNS,
};
pub use processor::DataProcessor;
pub use writer::ReferencedWriter;
