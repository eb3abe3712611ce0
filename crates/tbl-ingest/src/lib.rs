//! Dataset ingestion for summary tables.
//!
//! Reads a CSV file into a [`tbl_model::Dataset`] through Polars and applies
//! an optional JSON metadata sidecar (labels, declared kinds, level order).
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tbl_ingest::load_dataset;
//!
//! let (dataset, applied) = load_dataset(
//!     Path::new("data/trial.csv"),
//!     Some(Path::new("data/trial.meta.json")),
//! )?;
//! ```

mod csv;
mod error;
mod metadata;

use std::path::Path;

use tbl_model::Dataset;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{INFER_SCHEMA_ROWS, frame_to_dataset, read_csv_dataset, read_csv_frame};

// === Metadata ===
pub use metadata::{AppliedMetadata, ColumnMetadata, MetadataFile, apply_metadata, load_metadata};

/// Reads `csv` and applies the metadata sidecar when given.
pub fn load_dataset(csv: &Path, metadata: Option<&Path>) -> Result<(Dataset, AppliedMetadata)> {
    let mut dataset = read_csv_dataset(csv)?;
    let applied = match metadata {
        Some(path) => apply_metadata(&mut dataset, &load_metadata(path)?)?,
        None => AppliedMetadata::default(),
    };
    Ok((dataset, applied))
}
