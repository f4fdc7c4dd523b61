use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads configuration, reads collected records, or writes exports.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the delimited-text writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up while building an output archive.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Raised when the configuration file exists but cannot be understood.
    #[error("invalid configuration file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Raised when an input document does not have the shape of a record set.
    #[error("invalid record input: {0}")]
    InvalidInput(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when an archive is requested for a directory without files.
    #[error("no files to archive in {0}")]
    NothingToArchive(PathBuf),

    /// Raised when an export is asked to write no sheets at all.
    #[error("export {0} has no sheets")]
    EmptyExport(String),

    /// Raised when neither the spreadsheet nor the fallback could be written.
    #[error("export failed: {spreadsheet}; fallback failed: {fallback}")]
    ExportFailed { spreadsheet: String, fallback: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
