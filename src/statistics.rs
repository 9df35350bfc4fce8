//! Descriptive statistics over a dataset view: numeric and categorical
//! summaries, Pearson correlation, and missing-value counts.
//!
//! All four entry points are pure functions of the dataset they are handed;
//! the numeric/categorical partition is recomputed per call rather than
//! carried between requests.

use crate::dataset::{numeric_values, Dataset};
use crate::error::Result;
use crate::markup::TableArtifact;
use polars::prelude::*;
use std::collections::HashMap;

pub const NO_NUMERIC_COLUMNS: &str = "No numerical columns to analyze";
pub const NO_CATEGORICAL_COLUMNS: &str = "No categorical columns to analyze";
pub const NO_CORRELATION_COLUMNS: &str = "No numerical columns to analyze correlations";

const NUMERIC_SUMMARY_INDEX: [&str; 8] =
    ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
const CATEGORICAL_SUMMARY_INDEX: [&str; 4] = ["count", "unique", "top", "freq"];

/// Output of a statistics computation: a table, or an explicit marker when
/// the selection has nothing of the required kind to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsArtifact {
    Table(TableArtifact),
    Empty(&'static str),
}

impl StatsArtifact {
    pub fn as_table(&self) -> Option<&TableArtifact> {
        match self {
            Self::Table(table) => Some(table),
            Self::Empty(_) => None,
        }
    }
}

/// Render a statistics artifact for transport; the empty marker becomes a
/// paragraph element rather than an empty table.
pub fn artifact_markup(artifact: &StatsArtifact) -> String {
    match artifact {
        StatsArtifact::Table(table) => crate::markup::table_markup(table),
        StatsArtifact::Empty(message) => format!("<p>{}</p>", message),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn fmt2(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.2}", round2(v))
    }
}

/// q-th percentile (0..=1) of an ascending-sorted slice, linearly
/// interpolated between closest ranks.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = pos - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Per-column count, mean, std, min, quartiles, and max over the numeric
/// columns of the dataset, rounded to 2 decimal places.
pub fn numeric_summary(dataset: &Dataset) -> Result<StatsArtifact> {
    let numeric = dataset.classify().numeric;
    if numeric.is_empty() {
        return Ok(StatsArtifact::Empty(NO_NUMERIC_COLUMNS));
    }

    let mut per_column: Vec<Vec<String>> = Vec::with_capacity(numeric.len());
    for name in &numeric {
        let series = dataset.frame().column(name)?.as_materialized_series();
        let mut values = numeric_values(series);
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let count = values.len() as f64;
        let min = values.first().copied().unwrap_or(f64::NAN);
        let max = values.last().copied().unwrap_or(f64::NAN);
        per_column.push(vec![
            fmt2(count),
            fmt2(mean(&values)),
            fmt2(std_dev(&values)),
            fmt2(min),
            fmt2(percentile(&values, 0.25)),
            fmt2(percentile(&values, 0.50)),
            fmt2(percentile(&values, 0.75)),
            fmt2(max),
        ]);
    }

    // Transpose: rows are statistics, columns are dataset columns.
    let cells = (0..NUMERIC_SUMMARY_INDEX.len())
        .map(|row| per_column.iter().map(|col| col[row].clone()).collect())
        .collect();

    Ok(StatsArtifact::Table(TableArtifact {
        index: NUMERIC_SUMMARY_INDEX.iter().map(|s| s.to_string()).collect(),
        columns: numeric,
        cells,
    }))
}

/// Non-null value frequencies of a string column, most frequent first; ties
/// break on the value, keeping the ordering stable across calls.
pub(crate) fn str_value_counts(series: &Series) -> Result<Vec<(String, usize)>> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in series.str()?.iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut pairs: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(pairs)
}

/// Per-column count, unique-value count, most frequent value, and its
/// frequency over the categorical columns of the dataset.
pub fn categorical_summary(dataset: &Dataset) -> Result<StatsArtifact> {
    let categorical = dataset.classify().categorical;
    if categorical.is_empty() {
        return Ok(StatsArtifact::Empty(NO_CATEGORICAL_COLUMNS));
    }

    let mut per_column: Vec<Vec<String>> = Vec::with_capacity(categorical.len());
    for name in &categorical {
        let series = dataset.frame().column(name)?.as_materialized_series();
        let pairs = str_value_counts(series)?;
        let count: usize = pairs.iter().map(|(_, n)| n).sum();
        let (top, freq) = match pairs.first() {
            Some((value, n)) => (value.clone(), n.to_string()),
            None => ("NaN".to_string(), "NaN".to_string()),
        };
        per_column.push(vec![count.to_string(), pairs.len().to_string(), top, freq]);
    }

    let cells = (0..CATEGORICAL_SUMMARY_INDEX.len())
        .map(|row| per_column.iter().map(|col| col[row].clone()).collect())
        .collect();

    Ok(StatsArtifact::Table(TableArtifact {
        index: CATEGORICAL_SUMMARY_INDEX
            .iter()
            .map(|s| s.to_string())
            .collect(),
        columns: categorical,
        cells,
    }))
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let mean_x = mean(x);
    let mean_y = mean(y);
    let numerator: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let var_x: f64 = x.iter().map(|v| (v - mean_x).powi(2)).sum();
    let var_y: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    numerator / (var_x.sqrt() * var_y.sqrt())
}

/// Pairwise Pearson correlations over the numeric columns, dropping nulls
/// per pair. `None` when fewer than 2 numeric columns exist.
pub fn correlation_values(dataset: &Dataset) -> Result<Option<(Vec<String>, Vec<Vec<f64>>)>> {
    let numeric = dataset.classify().numeric;
    if numeric.len() < 2 {
        return Ok(None);
    }

    let n = numeric.len();
    let mut matrix = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let col_i = dataset.frame().column(&numeric[i])?;
            let col_j = dataset.frame().column(&numeric[j])?;
            let mask = col_i.is_not_null() & col_j.is_not_null();
            let clean_i = col_i.filter(&mask)?;
            let clean_j = col_j.filter(&mask)?;
            let values_i = numeric_values(clean_i.as_materialized_series());
            let values_j = numeric_values(clean_j.as_materialized_series());
            let r = pearson(&values_i, &values_j);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    Ok(Some((numeric, matrix)))
}

/// Correlation matrix as a table artifact, rounded to 2 decimal places.
pub fn correlation_matrix(dataset: &Dataset) -> Result<StatsArtifact> {
    let Some((columns, matrix)) = correlation_values(dataset)? else {
        return Ok(StatsArtifact::Empty(NO_CORRELATION_COLUMNS));
    };
    let cells = matrix
        .iter()
        .map(|row| row.iter().map(|v| fmt2(*v)).collect())
        .collect();
    Ok(StatsArtifact::Table(TableArtifact {
        index: columns.clone(),
        columns,
        cells,
    }))
}

/// Per-column null counts over every column of the dataset, numeric and
/// categorical alike.
pub fn missing_values(dataset: &Dataset) -> Result<StatsArtifact> {
    let names = dataset.column_names();
    let mut cells = Vec::with_capacity(names.len());
    for name in &names {
        let null_count = dataset.frame().column(name)?.null_count();
        cells.push(vec![null_count.to_string()]);
    }
    Ok(StatsArtifact::Table(TableArtifact {
        index: names,
        columns: vec!["Missing Values".to_string()],
        cells,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.5), 2.5);
        assert_eq!(percentile(&values, 0.25), 1.75);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 4.0);
    }

    #[test]
    fn percentile_of_empty_is_nan() {
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn std_dev_needs_two_values() {
        assert!(std_dev(&[1.0]).is_nan());
        assert!((std_dev(&[1.0, 3.0]) - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn fmt2_handles_nan_and_rounding() {
        assert_eq!(fmt2(f64::NAN), "NaN");
        assert_eq!(fmt2(1.2345), "1.23");
        assert_eq!(fmt2(1.567), "1.57");
        assert_eq!(fmt2(3.0), "3.00");
    }

    #[test]
    fn value_counts_tie_breaks_on_value() {
        let series = Series::new("c".into(), &["b", "a", "b", "a", "c"]);
        let pairs = str_value_counts(&series).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }
}
