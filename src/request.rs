//! Request validation: typed views over the transport layer's flat
//! key→value parameter map, checked against the active dataset before any
//! computation runs.

use crate::dataset::Dataset;
use crate::error::{AnalysisError, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// Flat key→value parameter map as delivered by the transport layer.
/// Repeated keys carry list-valued parameters.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, Vec<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: &str) -> &mut Self {
        self.values
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    /// First value for the key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    /// All values for the key, in insertion order.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.values.get(key).cloned().unwrap_or_default()
    }

    /// Non-negative integer parameter; present but unparseable values are an
    /// error, absent ones are `None`.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<usize>()
                .map(Some)
                .map_err(|_| AnalysisError::InvalidParameter {
                    name: key.to_string(),
                    message: format!("'{}' is not a non-negative integer", raw),
                }),
        }
    }
}

/// The closed catalog of chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Histogram,
    Boxplot,
    Scatter,
    Bar,
    Pie,
    Pairplot,
    Heatmap,
}

impl PlotKind {
    pub const ALL: [Self; 7] = [
        Self::Histogram,
        Self::Boxplot,
        Self::Scatter,
        Self::Bar,
        Self::Pie,
        Self::Pairplot,
        Self::Heatmap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Boxplot => "boxplot",
            Self::Scatter => "scatter",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Pairplot => "pairplot",
            Self::Heatmap => "heatmap",
        }
    }

    /// Display name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Boxplot => "box plot",
            Self::Scatter => "scatter plot",
            Self::Bar => "bar plot",
            Self::Pie => "pie chart",
            Self::Pairplot => "pair plot",
            Self::Heatmap => "heatmap",
        }
    }

    /// Auto kinds span all numeric columns and take no explicit selection.
    pub fn is_auto(self) -> bool {
        matches!(self, Self::Pairplot | Self::Heatmap)
    }
}

impl FromStr for PlotKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AnalysisError::UnknownPlotKind(s.to_string()))
    }
}

/// A validated plot request: the kind plus the column selection the renderer
/// will honor. Auto kinds always carry an empty selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotSpec {
    pub kind: PlotKind,
    pub columns: Vec<String>,
}

/// Check a plot request against the catalog, the per-kind arity rules, and
/// the dataset schema.
pub fn validate_plot_request(
    dataset: &Dataset,
    kind: &str,
    columns: &[String],
) -> Result<PlotSpec> {
    let kind = PlotKind::from_str(kind)?;

    if kind.is_auto() {
        // Explicit selections are ignored: these kinds operate over all
        // numeric columns and skip the selection-required check.
        return Ok(PlotSpec {
            kind,
            columns: Vec::new(),
        });
    }

    if columns.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }

    let violation: Option<&'static str> = match kind {
        PlotKind::Histogram | PlotKind::Bar | PlotKind::Pie if columns.len() != 1 => {
            Some("exactly 1 column")
        }
        PlotKind::Scatter if columns.len() != 2 => Some("exactly 2 columns"),
        _ => None,
    };
    if let Some(expected) = violation {
        return Err(AnalysisError::InvalidColumnCount {
            kind: kind.display_name(),
            expected,
            actual: columns.len(),
        });
    }

    for name in columns {
        if !dataset.has_column(name) {
            return Err(AnalysisError::UnknownColumn(name.clone()));
        }
    }

    Ok(PlotSpec {
        kind,
        columns: columns.to_vec(),
    })
}

/// Row subset selector for row-wise analysis requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRange {
    First10,
    Last10,
    All,
}

impl RowRange {
    /// Permissive: any token outside the enumeration means the whole
    /// dataset, not an error.
    pub fn parse(token: &str) -> Self {
        match token {
            "first_10" => Self::First10,
            "last_10" => Self::Last10,
            _ => Self::All,
        }
    }

    pub fn apply(self, dataset: &Dataset) -> Dataset {
        match self {
            Self::First10 => dataset.head(10),
            Self::Last10 => dataset.tail(10),
            Self::All => dataset.clone(),
        }
    }
}

/// Column selection for an analysis request: empty selections and unknown
/// columns are rejected outright.
pub fn validate_analysis_columns(dataset: &Dataset, columns: &[String]) -> Result<Vec<String>> {
    if columns.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }
    for name in columns {
        if !dataset.has_column(name) {
            return Err(AnalysisError::UnknownColumn(name.clone()));
        }
    }
    Ok(columns.to_vec())
}

/// Column filter for a table view: unknown columns are silently dropped.
/// Analysis requests reject them instead.
pub fn table_view_columns(dataset: &Dataset, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .filter(|name| dataset.has_column(name))
        .cloned()
        .collect()
}

/// A validated table-view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub start_row: usize,
    pub num_rows: usize,
    pub specific_row: Option<usize>,
    pub columns: Vec<String>,
}

/// Check pagination bounds and the column filter for a table view. A
/// non-numeric `specific_row` token is ignored and pagination applies; a
/// numeric one outside `[0, row_count)` is an error.
pub fn validate_table_view(
    dataset: &Dataset,
    params: &Params,
    default_num_rows: usize,
) -> Result<TableView> {
    let start_row = params.get_usize("start_row")?.unwrap_or(0);
    let num_rows = params.get_usize("num_rows")?.unwrap_or(default_num_rows);

    let specific_row = params.get("specific_row").and_then(|raw| {
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            raw.parse::<usize>().ok()
        } else {
            None
        }
    });
    if let Some(index) = specific_row {
        if index >= dataset.row_count() {
            return Err(AnalysisError::RowIndexOutOfRange {
                index,
                row_count: dataset.row_count(),
            });
        }
    }

    let columns = table_view_columns(dataset, &params.get_all("columns"));

    Ok(TableView {
        start_row,
        num_rows,
        specific_row,
        columns,
    })
}
