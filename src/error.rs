//! Error handling for analysis and plot requests.

use thiserror::Error;

/// Failure modes of the request pipeline.
///
/// Every variant is local to a single request, non-retryable, and carries a
/// human-readable message surfaced verbatim to the caller. [`code`] supplies
/// the distinguishing status the transport layer attaches to the reply.
///
/// [`code`]: AnalysisError::code
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to parse tabular data: {0}")]
    Parse(String),

    #[error("please select at least one column")]
    EmptySelection,

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("row index {index} out of range (dataset has {row_count} rows)")]
    RowIndexOutOfRange { index: usize, row_count: usize },

    #[error("{kind} requires {expected}, got {actual}")]
    InvalidColumnCount {
        kind: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("unknown plot kind '{0}'")]
    UnknownPlotKind(String),

    #[error("invalid value for '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("failed to render plot: {0}")]
    Render(String),

    #[error("no dataset loaded, upload one first")]
    NoActiveDataset,

    #[error("dataframe operation failed: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
}

impl AnalysisError {
    /// Stable machine-readable code for the transport layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::EmptySelection => "empty_selection",
            Self::UnknownColumn(_) => "unknown_column",
            Self::RowIndexOutOfRange { .. } => "row_index_out_of_range",
            Self::InvalidColumnCount { .. } => "invalid_column_count",
            Self::UnknownPlotKind(_) => "unknown_plot_kind",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::Render(_) => "render_error",
            Self::NoActiveDataset => "no_active_dataset",
            Self::DataFrame(_) => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AnalysisError::EmptySelection.code(), "empty_selection");
        assert_eq!(AnalysisError::NoActiveDataset.code(), "no_active_dataset");
        assert_eq!(
            AnalysisError::UnknownColumn("x".into()).code(),
            "unknown_column"
        );
    }

    #[test]
    fn messages_name_the_offender() {
        let err = AnalysisError::InvalidColumnCount {
            kind: "scatter plot",
            expected: "exactly 2 columns",
            actual: 3,
        };
        assert_eq!(err.to_string(), "scatter plot requires exactly 2 columns, got 3");
    }
}
