//! datalyze: statistics and visualization over in-memory tabular datasets.
//!
//! The pipeline is: a parameter map arrives from the transport layer, the
//! request validator checks it against the active [`Dataset`], the
//! statistics or chart engine computes the artifact, and the serializer
//! encodes it for the caller. See [`service::dispatch`].

pub mod chart;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod markup;
pub mod request;
pub mod service;
pub mod statistics;

pub use cli::Args;
pub use config::{AppConfig, ChartConfig, ConfigManager, TableConfig};
pub use dataset::{ColumnClasses, Dataset, LoadOptions};
pub use error::AnalysisError;
pub use request::{Params, PlotKind, PlotSpec, RowRange};
pub use service::{dispatch, Action, ErrorBody, Reply};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "datalyze";
