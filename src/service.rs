//! Request dispatch: validate against the active dataset, run the matching
//! engine, serialize the artifact. Validation failures short-circuit before
//! any computation runs.

use crate::chart;
use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::error::{AnalysisError, Result};
use crate::markup::{self, TableArtifact};
use crate::request::{self, Params, RowRange};
use crate::statistics::{self, artifact_markup};
use serde::Serialize;
use std::str::FromStr;

/// The actions a caller can request against the active dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Preview,
    Table,
    Summary,
    AnalyzeColumns,
    AnalyzeRows,
    Plot,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Table => "table",
            Self::Summary => "summary",
            Self::AnalyzeColumns => "analyze_columns",
            Self::AnalyzeRows => "analyze_rows",
            Self::Plot => "plot",
        }
    }
}

impl FromStr for Action {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "preview" => Ok(Self::Preview),
            "table" => Ok(Self::Table),
            "summary" => Ok(Self::Summary),
            "analyze_columns" => Ok(Self::AnalyzeColumns),
            "analyze_rows" => Ok(Self::AnalyzeRows),
            "plot" => Ok(Self::Plot),
            other => Err(AnalysisError::InvalidParameter {
                name: "action".to_string(),
                message: format!("unknown action '{}'", other),
            }),
        }
    }
}

/// Reply envelope returned to the transport layer. Absent fields are left
/// out of the serialized payload entirely.
#[derive(Debug, Default, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_values: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
}

/// Structured failure payload with a distinguishing status code.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl From<&AnalysisError> for ErrorBody {
    fn from(err: &AnalysisError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code(),
        }
    }
}

/// Entry point of the pipeline. `dataset` is handed in explicitly by the
/// session layer; requests arriving before a successful load fail with
/// `NoActiveDataset`.
pub fn dispatch(dataset: Option<&Dataset>, params: &Params, config: &AppConfig) -> Result<Reply> {
    let dataset = dataset.ok_or(AnalysisError::NoActiveDataset)?;
    let action = params
        .get("action")
        .ok_or_else(|| AnalysisError::InvalidParameter {
            name: "action".to_string(),
            message: "missing".to_string(),
        })?
        .parse::<Action>()?;
    log::debug!("dispatching action {}", action.as_str());

    match action {
        Action::Preview => preview(dataset, config),
        Action::Table => table_view(dataset, params, config),
        Action::Summary => summary(dataset),
        Action::AnalyzeColumns => analyze_columns(dataset, params),
        Action::AnalyzeRows => analyze_rows(dataset, params),
        Action::Plot => plot(dataset, params, config),
    }
}

/// Rows of a dataset view as a table artifact. `index_offset` restores the
/// source dataset's dense zero-based row labels.
fn page_table(view: &Dataset, index_offset: usize) -> Result<TableArtifact> {
    let columns = view.column_names();
    let height = view.row_count();
    let mut cells: Vec<Vec<String>> = (0..height).map(|_| Vec::new()).collect();
    for name in &columns {
        let series = view.frame().column(name)?.as_materialized_series();
        for (i, row) in cells.iter_mut().enumerate() {
            row.push(cell_text(&series.get(i)?));
        }
    }
    let index = (0..height).map(|i| (index_offset + i).to_string()).collect();
    Ok(TableArtifact {
        index,
        columns,
        cells,
    })
}

fn cell_text(value: &polars::prelude::AnyValue) -> String {
    use polars::prelude::AnyValue;
    match value {
        AnyValue::Null => "NaN".to_string(),
        other => other.str_value().to_string(),
    }
}

fn preview(dataset: &Dataset, config: &AppConfig) -> Result<Reply> {
    let head = dataset.head(config.table.preview_rows);
    Ok(Reply {
        data: Some(markup::table_markup(&page_table(&head, 0)?)),
        total_rows: Some(dataset.row_count()),
        ..Reply::default()
    })
}

fn table_view(dataset: &Dataset, params: &Params, config: &AppConfig) -> Result<Reply> {
    let view = request::validate_table_view(dataset, params, config.table.page_rows)?;
    let (window, offset) = match view.specific_row {
        Some(index) => (dataset.row(index)?, index),
        None => (dataset.slice(view.start_row, view.num_rows), view.start_row),
    };
    let window = if view.columns.is_empty() {
        window
    } else {
        window.select_columns(&view.columns)?
    };
    Ok(Reply {
        data: Some(markup::table_markup(&page_table(&window, offset)?)),
        total_rows: Some(dataset.row_count()),
        ..Reply::default()
    })
}

/// The original initial-load statistics: all four artifacts over the whole
/// dataset.
fn summary(dataset: &Dataset) -> Result<Reply> {
    Ok(Reply {
        numerical: Some(artifact_markup(&statistics::numeric_summary(dataset)?)),
        categorical: Some(artifact_markup(&statistics::categorical_summary(dataset)?)),
        correlation: Some(artifact_markup(&statistics::correlation_matrix(dataset)?)),
        missing_values: Some(artifact_markup(&statistics::missing_values(dataset)?)),
        total_rows: Some(dataset.row_count()),
        ..Reply::default()
    })
}

/// Numeric, categorical, and missing-value artifacts over a derived view.
/// Subset analyses carry no correlation table.
fn analyze(view: &Dataset) -> Result<Reply> {
    Ok(Reply {
        numerical: Some(artifact_markup(&statistics::numeric_summary(view)?)),
        categorical: Some(artifact_markup(&statistics::categorical_summary(view)?)),
        missing_values: Some(artifact_markup(&statistics::missing_values(view)?)),
        ..Reply::default()
    })
}

fn analyze_columns(dataset: &Dataset, params: &Params) -> Result<Reply> {
    let columns = request::validate_analysis_columns(dataset, &params.get_all("columns"))?;
    let view = dataset.select_columns(&columns)?;
    analyze(&view)
}

fn analyze_rows(dataset: &Dataset, params: &Params) -> Result<Reply> {
    let range = RowRange::parse(params.get("row_range").unwrap_or("all"));
    let view = range.apply(dataset);
    analyze(&view)
}

fn plot(dataset: &Dataset, params: &Params, config: &AppConfig) -> Result<Reply> {
    let kind = params
        .get("plot_type")
        .ok_or_else(|| AnalysisError::InvalidParameter {
            name: "plot_type".to_string(),
            message: "missing".to_string(),
        })?;
    let spec = request::validate_plot_request(dataset, kind, &params.get_all("columns"))?;
    let png = chart::render(dataset, &spec, &config.chart)?;
    Ok(Reply {
        plot_base64: Some(markup::png_base64(&png)),
        ..Reply::default()
    })
}
