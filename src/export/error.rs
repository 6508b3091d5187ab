//! Export error type

use thiserror::Error;

/// A failed render, fetch or clipboard write.
///
/// `Display` is exactly the underlying message so it can be shown verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("{0}")]
    Render(String),
    #[error("{0}")]
    Fetch(String),
    #[error("{0}")]
    Clipboard(String),
}

impl ExportError {
    /// Short name of the failing step, for diagnostics.
    pub fn step(&self) -> &'static str {
        match self {
            ExportError::Render(_) => "render",
            ExportError::Fetch(_) => "fetch",
            ExportError::Clipboard(_) => "clipboard",
        }
    }
}
