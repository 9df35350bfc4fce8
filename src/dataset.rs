//! The active tabular dataset: CSV loading, column-kind classification,
//! and read-only row/column views.

use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Options for reading a delimited text file into a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    fn to_read_options(&self) -> CsvReadOptions {
        let mut read_options = CsvReadOptions::default();
        if let Some(has_header) = self.has_header {
            read_options.has_header = has_header;
        }
        if let Some(skip_rows) = self.skip_rows {
            read_options.skip_rows = skip_rows;
        }
        let delimiter = self.delimiter;
        read_options.map_parse_options(|opts| {
            if let Some(delimiter) = delimiter {
                opts.with_separator(delimiter)
            } else {
                opts
            }
        })
    }
}

/// Numeric/categorical partition of a dataset's columns, in schema order.
///
/// Derived from the data on every call, never stored as session state; a
/// column of any other kind (boolean, temporal) belongs to neither set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnClasses {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

/// An in-memory tabular dataset with uniform row count and unique column
/// names. Row index is a dense zero-based range, stable once loaded.
///
/// All selection operations return derived copies; the source is never
/// mutated.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Parse raw comma-separated bytes into a dataset.
    pub fn from_csv_bytes(bytes: &[u8], options: &LoadOptions) -> Result<Self> {
        let df = options
            .to_read_options()
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;
        log::debug!(
            "loaded dataset: {} rows x {} columns",
            df.height(),
            df.width()
        );
        Ok(Self { df })
    }

    /// Parse a comma-separated file into a dataset.
    pub fn from_csv_path(path: &Path, options: &LoadOptions) -> Result<Self> {
        let df = options
            .to_read_options()
            .try_into_reader_with_file_path(Some(path.into()))
            .and_then(|reader| reader.finish())
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;
        log::debug!(
            "loaded {}: {} rows x {} columns",
            path.display(),
            df.height(),
            df.width()
        );
        Ok(Self { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.schema().get(name).is_some()
    }

    /// Partition the columns into numeric and categorical sets by inspecting
    /// each column's dtype.
    pub fn classify(&self) -> ColumnClasses {
        let schema = self.df.schema();
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for (name, dtype) in schema.iter() {
            if is_numeric_dtype(dtype) {
                numeric.push(name.to_string());
            } else if is_categorical_dtype(dtype) {
                categorical.push(name.to_string());
            }
        }
        ColumnClasses {
            numeric,
            categorical,
        }
    }

    /// Derived view holding only the named columns, in the given order.
    /// Fails with `UnknownColumn` on the first name absent from the schema.
    pub fn select_columns(&self, names: &[String]) -> Result<Self> {
        for name in names {
            if !self.has_column(name) {
                return Err(AnalysisError::UnknownColumn(name.clone()));
            }
        }
        let df = self.df.select(names.iter().map(|s| s.as_str()))?;
        Ok(Self { df })
    }

    pub fn head(&self, n: usize) -> Self {
        Self {
            df: self.df.head(Some(n)),
        }
    }

    pub fn tail(&self, n: usize) -> Self {
        Self {
            df: self.df.tail(Some(n)),
        }
    }

    /// Row window starting at `start`. Out-of-range windows clamp to an
    /// empty view rather than erroring.
    pub fn slice(&self, start: usize, len: usize) -> Self {
        Self {
            df: self.df.slice(start as i64, len),
        }
    }

    /// Single-row view. Unlike [`slice`], an index outside `[0, row_count)`
    /// is an error.
    ///
    /// [`slice`]: Dataset::slice
    pub fn row(&self, index: usize) -> Result<Self> {
        if index >= self.row_count() {
            return Err(AnalysisError::RowIndexOutOfRange {
                index,
                row_count: self.row_count(),
            });
        }
        Ok(self.slice(index, 1))
    }
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub(crate) fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}

/// Non-null values of a numeric column as f64, in row order.
pub(crate) fn numeric_values(series: &Series) -> Vec<f64> {
    match series.cast(&DataType::Float64) {
        Ok(cast) => match cast.f64() {
            Ok(ca) => ca.iter().flatten().filter(|v| v.is_finite()).collect(),
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let df = df!(
            "age" => &[Some(34i64), None, Some(29)],
            "score" => &[91.5f64, 78.0, 88.25],
            "city" => &["Oslo", "Lima", "Oslo"],
        )
        .unwrap();
        Dataset::new(df)
    }

    #[test]
    fn classify_partitions_by_dtype() {
        let classes = sample().classify();
        assert_eq!(classes.numeric, vec!["age", "score"]);
        assert_eq!(classes.categorical, vec!["city"]);
    }

    #[test]
    fn classify_of_subset_covers_exactly_the_subset() {
        let dataset = sample();
        let subset = dataset
            .select_columns(&["city".into(), "age".into()])
            .unwrap();
        let classes = subset.classify();
        let mut all: Vec<String> = classes.numeric.clone();
        all.extend(classes.categorical.clone());
        all.sort();
        assert_eq!(all, vec!["age", "city"]);
        assert!(classes.numeric.iter().all(|c| !classes.categorical.contains(c)));
    }

    #[test]
    fn select_columns_rejects_unknown() {
        let err = sample()
            .select_columns(&["age".into(), "height".into()])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownColumn(name) if name == "height"));
    }

    #[test]
    fn row_boundaries() {
        let dataset = sample();
        assert_eq!(dataset.row(2).unwrap().row_count(), 1);
        let err = dataset.row(3).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::RowIndexOutOfRange { index: 3, row_count: 3 }
        ));
    }

    #[test]
    fn out_of_range_slice_is_empty() {
        assert_eq!(sample().slice(10, 5).row_count(), 0);
    }

    #[test]
    fn from_csv_bytes_parses_and_infers() {
        let dataset =
            Dataset::from_csv_bytes(b"a,b\n1,x\n2,y\n", &LoadOptions::new()).unwrap();
        assert_eq!(dataset.row_count(), 2);
        let classes = dataset.classify();
        assert_eq!(classes.numeric, vec!["a"]);
        assert_eq!(classes.categorical, vec!["b"]);
    }

    #[test]
    fn ragged_rows_fail_with_parse_error() {
        let err =
            Dataset::from_csv_bytes(b"a,b\n1,2,3\n", &LoadOptions::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn numeric_values_skips_nulls() {
        let dataset = sample();
        let series = dataset.frame().column("age").unwrap().as_materialized_series();
        assert_eq!(numeric_values(series), vec![34.0, 29.0]);
    }
}
