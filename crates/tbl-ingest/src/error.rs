//! Error types for dataset ingestion.

use std::path::PathBuf;

use tbl_model::DatasetError;
use thiserror::Error;

/// Errors that can occur while loading a dataset or its metadata.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has no columns.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    // === Metadata Errors ===
    /// Metadata file is not valid JSON of the expected shape.
    #[error("unexpected metadata format in {path}: {reason}")]
    MetadataFormat { path: PathBuf, reason: String },

    /// Invalid value in a metadata field.
    #[error("invalid {field} value '{value}' for column '{column}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        column: String,
        reason: String,
    },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Converted columns violate a dataset invariant.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Maps an I/O error on `path`, keeping not-found distinct.
pub(crate) fn io_error(path: &std::path::Path, err: std::io::Error) -> IngestError {
    if err.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/trial.csv"),
        };
        assert_eq!(err.to_string(), "file not found: /path/to/trial.csv");
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }

    #[test]
    fn test_io_error_not_found() {
        let err = io_error(
            std::path::Path::new("missing.json"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }
}
