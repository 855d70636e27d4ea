//! Error types for sheetexport

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for all export operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// Layout was finalized before any column headers were set
    #[error("Cell column headers need to be set first")]
    MissingColumnHeaders,

    /// Switching to a sheet that was never added
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    UnknownSheet { sheet: String, available: String },

    /// Adding a sheet whose name is already registered
    #[error("Sheet '{0}' already exists")]
    DuplicateSheet(String),

    /// Data laid out a second time on the same sheet
    #[error("Data was already set on sheet '{0}'")]
    DataAlreadySet(String),

    /// Data, sheet name or layout input that cannot be normalized
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure surfaced by the spreadsheet writer (cell writes, ranges, flush)
    #[error("Failed to write spreadsheet: {0}")]
    WriterFailure(String),

    /// Failure surfaced by the storage provider
    #[error("Storage failure on disk '{disk}' for '{path}': {message}")]
    StorageFailure {
        disk: String,
        path: String,
        message: String,
    },
}

impl ExportError {
    /// Build a storage failure for the given disk and path
    pub fn storage(disk: &str, path: &str, message: impl Into<String>) -> Self {
        ExportError::StorageFailure {
            disk: disk.to_string(),
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// True for errors the caller caused (bad setup order, bad names or data)
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ExportError::MissingColumnHeaders
                | ExportError::UnknownSheet { .. }
                | ExportError::DuplicateSheet(_)
                | ExportError::DataAlreadySet(_)
                | ExportError::InvalidInput(_)
        )
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::WriterFailure(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::WriterFailure(err.to_string())
    }
}
