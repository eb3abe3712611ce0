//! Column metadata sidecar.
//!
//! A JSON file describing display labels, declared kinds and level order:
//!
//! ```json
//! {
//!   "columns": [
//!     { "name": "am", "label": "Transmission", "levels": ["automatic", "manual"] },
//!     { "name": "vs", "kind": "dichotomous:1" }
//!   ]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tbl_model::{Dataset, DeclaredKind};

use crate::error::{IngestError, Result, io_error};

/// Metadata entry for one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMetadata {
    pub name: String,
    pub label: Option<String>,
    /// `auto`, `categorical`, `continuous`, `dichotomous` or
    /// `dichotomous:<level>`.
    pub kind: Option<String>,
    pub levels: Option<Vec<String>>,
}

/// Parsed metadata file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataFile {
    pub columns: Vec<ColumnMetadata>,
}

impl MetadataFile {
    pub fn get(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// What [`apply_metadata`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedMetadata {
    pub labelled: BTreeSet<String>,
    pub typed: BTreeSet<String>,
    pub leveled: BTreeSet<String>,
    /// Entries naming columns the dataset does not have.
    pub unknown: BTreeSet<String>,
}

impl AppliedMetadata {
    pub fn has_changes(&self) -> bool {
        !self.labelled.is_empty() || !self.typed.is_empty() || !self.leveled.is_empty()
    }
}

/// Loads a metadata sidecar from `path`.
pub fn load_metadata(path: &Path) -> Result<MetadataFile> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let metadata: MetadataFile =
        serde_json::from_str(&text).map_err(|e| IngestError::MetadataFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    tracing::debug!(
        path = %path.display(),
        columns = metadata.columns.len(),
        "loaded column metadata"
    );
    Ok(metadata)
}

/// Copies labels, kinds and levels onto the dataset's column metadata.
///
/// Entries for unknown columns are skipped with a warning. An unparseable
/// kind is an error and leaves the dataset untouched.
pub fn apply_metadata(dataset: &mut Dataset, metadata: &MetadataFile) -> Result<AppliedMetadata> {
    let kinds = metadata
        .columns
        .iter()
        .map(|entry| {
            entry
                .kind
                .as_deref()
                .map(|kind| {
                    kind.parse::<DeclaredKind>()
                        .map_err(|reason| IngestError::InvalidValue {
                            field: "kind".to_string(),
                            value: kind.to_string(),
                            column: entry.name.clone(),
                            reason,
                        })
                })
                .transpose()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut applied = AppliedMetadata::default();
    for (entry, kind) in metadata.columns.iter().zip(kinds) {
        let Some(meta) = dataset.meta_mut(&entry.name) else {
            tracing::warn!(column = %entry.name, "metadata for unknown column ignored");
            applied.unknown.insert(entry.name.clone());
            continue;
        };
        if let Some(label) = entry.label.as_deref().map(str::trim)
            && !label.is_empty()
        {
            meta.label = Some(label.to_string());
            applied.labelled.insert(entry.name.clone());
        }
        if let Some(kind) = kind {
            meta.kind = kind;
            applied.typed.insert(entry.name.clone());
        }
        if let Some(levels) = &entry.levels {
            meta.levels = Some(levels.clone());
            applied.leveled.insert(entry.name.clone());
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbl_model::Column;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::text("am", vec![Some("manual"), Some("automatic")]),
            Column::numeric("vs", vec![Some(0.0), Some(1.0)]),
        ])
        .unwrap()
    }

    fn entry(name: &str) -> ColumnMetadata {
        ColumnMetadata {
            name: name.to_string(),
            ..ColumnMetadata::default()
        }
    }

    #[test]
    fn test_apply_labels_kinds_levels() {
        let metadata = MetadataFile {
            columns: vec![
                ColumnMetadata {
                    label: Some("Transmission".to_string()),
                    levels: Some(vec!["automatic".to_string(), "manual".to_string()]),
                    ..entry("am")
                },
                ColumnMetadata {
                    kind: Some("dichotomous:1".to_string()),
                    ..entry("vs")
                },
                ColumnMetadata {
                    label: Some("Gears".to_string()),
                    ..entry("gear")
                },
            ],
        };
        let mut dataset = dataset();
        let applied = apply_metadata(&mut dataset, &metadata).unwrap();

        let am = dataset.column("am").unwrap();
        assert_eq!(am.meta.display_label(), "Transmission");
        assert_eq!(
            am.meta.levels.as_deref(),
            Some(&["automatic".to_string(), "manual".to_string()][..])
        );
        assert_eq!(
            dataset.column("vs").unwrap().meta.kind,
            DeclaredKind::Dichotomous {
                level: Some("1".to_string())
            }
        );
        assert!(applied.has_changes());
        assert!(applied.unknown.contains("gear"));
    }

    #[test]
    fn test_invalid_kind_leaves_dataset_untouched() {
        let metadata = MetadataFile {
            columns: vec![
                ColumnMetadata {
                    label: Some("Transmission".to_string()),
                    ..entry("am")
                },
                ColumnMetadata {
                    kind: Some("ordinal".to_string()),
                    ..entry("vs")
                },
            ],
        };
        let mut dataset = dataset();
        let result = apply_metadata(&mut dataset, &metadata);
        assert!(matches!(result, Err(IngestError::InvalidValue { .. })));
        assert_eq!(dataset, self::dataset());
    }

    #[test]
    fn test_blank_label_ignored() {
        let metadata = MetadataFile {
            columns: vec![ColumnMetadata {
                label: Some("   ".to_string()),
                ..entry("am")
            }],
        };
        let mut dataset = dataset();
        let applied = apply_metadata(&mut dataset, &metadata).unwrap();
        assert!(!applied.has_changes());
        assert_eq!(dataset.column("am").unwrap().meta.label, None);
    }
}
