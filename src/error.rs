use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every fallible operation of the merge pipeline.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the fatal conditions of a merge run.
///
/// Per-file problems with non-base inputs never surface here: they are logged
/// through the progress sink and the file is skipped.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Filesystem failure while listing inputs or reading configuration.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised when a JSON configuration file is malformed.
    #[error("cannot parse configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Raised when the input folder does not exist.
    #[error("input directory not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the input path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Raised when the input directory holds no matching spreadsheet files.
    #[error("no spreadsheet files found in {0}")]
    NoInputFiles(PathBuf),

    /// Raised when the base workbook cannot be opened for editing.
    #[error("failed to load workbook {path}: {reason}")]
    WorkbookLoad { path: PathBuf, reason: String },

    /// Raised when a workbook cannot be decoded or has no readable worksheet.
    #[error("failed to read {path}: {reason}")]
    SourceRead { path: PathBuf, reason: String },

    /// Raised when the base file has no usable header row.
    #[error("no header columns detected in {0}")]
    EmptyHeader(PathBuf),

    /// Raised when every input file had to be skipped.
    #[error("no valid input files left to merge")]
    NoValidInput,

    /// Raised when the output directory cannot be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised when the merged workbook cannot be written.
    #[error("failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    /// Raised when a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when the source column is injected into a schema that already has one.
    #[error("source column already injected into the header schema")]
    ProvenanceAlreadyInjected,

    /// Raised when the log subscriber cannot be installed.
    #[error("cannot install logging: {0}")]
    Logging(String),
}
