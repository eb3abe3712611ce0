//! CSV reading into a summary [`Dataset`].

use std::path::Path;

use polars::prelude::{AnyValue, CsvReadOptions, DataFrame, DataType, PolarsResult, SerReader};
use tbl_common::{any_to_bool, any_to_f64, any_to_text, parse_f64};
use tbl_model::{Column, ColumnData, Dataset};

use crate::error::{IngestError, Result, io_error};

/// Rows scanned by Polars when inferring column types.
pub const INFER_SCHEMA_ROWS: usize = 100;

/// Reads a CSV file with a single header row into a Polars DataFrame.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    std::fs::metadata(path).map_err(|e| io_error(path, e))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if df.width() == 0 {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    Ok(df)
}

/// Reads a CSV file into a dataset.
///
/// Integer and float columns become numeric, boolean columns logical.
/// Text columns whose non-missing cells all parse as numbers (for example
/// a numeric column with `NA` markers) become numeric; columns holding only
/// `TRUE`/`FALSE` become logical; everything else stays text.
pub fn read_csv_dataset(path: &Path) -> Result<Dataset> {
    let df = read_csv_frame(path)?;
    let dataset = frame_to_dataset(&df)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.columns().len(),
        "loaded dataset"
    );
    Ok(dataset)
}

/// Converts every DataFrame column into a dataset column.
pub fn frame_to_dataset(df: &DataFrame) -> Result<Dataset> {
    let columns = df
        .get_columns()
        .iter()
        .map(convert_column)
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::new(columns)?)
}

fn convert_column(column: &polars::prelude::Column) -> Result<Column> {
    let name = column.name().to_string();
    let cells = (0..column.len())
        .map(|row| column.get(row))
        .collect::<PolarsResult<Vec<AnyValue<'_>>>>()?;

    let data = match column.dtype() {
        DataType::Boolean => ColumnData::Logical(cells.into_iter().map(any_to_bool).collect()),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => ColumnData::Numeric(cells.into_iter().map(any_to_f64).collect()),
        dtype => {
            let texts: Vec<Option<String>> = cells.into_iter().map(any_to_text).collect();
            let kind = text_kind(&texts);
            tracing::debug!(column = %name, dtype = %dtype, kind, "converted text column");
            match kind {
                "numeric" => ColumnData::Numeric(
                    texts
                        .iter()
                        .map(|value| value.as_deref().and_then(parse_f64))
                        .collect(),
                ),
                "logical" => ColumnData::Logical(
                    texts
                        .iter()
                        .map(|value| value.as_deref().and_then(word_bool))
                        .collect(),
                ),
                _ => ColumnData::Text(texts),
            }
        }
    };
    Ok(Column::new(tbl_model::ColumnMeta::new(name), data))
}

/// Storage kind of a column read as text.
fn text_kind(values: &[Option<String>]) -> &'static str {
    let mut present = values.iter().flatten().peekable();
    if present.peek().is_none() {
        return "text";
    }
    if values.iter().flatten().all(|value| parse_f64(value).is_some()) {
        "numeric"
    } else if values.iter().flatten().all(|value| word_bool(value).is_some()) {
        "logical"
    } else {
        "text"
    }
}

/// `TRUE`/`FALSE` spelled out; single letters stay text (`F` may be a level).
fn word_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_typed_columns() {
        let file = create_temp_csv("mpg,cyl,am\n21.0,6,manual\n22.8,4,manual\n18.7,8,automatic\n");
        let dataset = read_csv_dataset(file.path()).unwrap();

        assert_eq!(dataset.row_count(), 3);
        assert_eq!(
            dataset.column_names().collect::<Vec<_>>(),
            vec!["mpg", "cyl", "am"]
        );
        assert_eq!(
            dataset.column("cyl").unwrap().data,
            ColumnData::Numeric(vec![Some(6.0), Some(4.0), Some(8.0)])
        );
        assert_eq!(
            dataset.column("am").unwrap().data,
            ColumnData::Text(vec![
                Some("manual".to_string()),
                Some("manual".to_string()),
                Some("automatic".to_string())
            ])
        );
    }

    #[test]
    fn test_numeric_with_missing_markers() {
        let file = create_temp_csv("age,site\n34,A\nNA,B\n51,.\n");
        let dataset = read_csv_dataset(file.path()).unwrap();
        assert_eq!(
            dataset.column("age").unwrap().data,
            ColumnData::Numeric(vec![Some(34.0), None, Some(51.0)])
        );
        assert_eq!(dataset.column("site").unwrap().missing_count(), 1);
    }

    #[test]
    fn test_logical_words() {
        let file = create_temp_csv("smoker,sex\nTRUE,F\nFALSE,F\nNA,F\n");
        let dataset = read_csv_dataset(file.path()).unwrap();
        assert_eq!(
            dataset.column("smoker").unwrap().data,
            ColumnData::Logical(vec![Some(true), Some(false), None])
        );
        assert!(matches!(
            dataset.column("sex").unwrap().data,
            ColumnData::Text(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = read_csv_dataset(Path::new("/nonexistent/trial.csv"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_text_kind() {
        let values = |items: &[&str]| -> Vec<Option<String>> {
            items.iter().map(|item| Some((*item).to_string())).collect()
        };
        assert_eq!(text_kind(&values(&["1", "2.5"])), "numeric");
        assert_eq!(text_kind(&values(&["true", "False"])), "logical");
        assert_eq!(text_kind(&values(&["T", "F"])), "text");
        assert_eq!(text_kind(&[None, None]), "text");
    }
}
