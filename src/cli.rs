use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for datalyze
#[derive(Parser, Debug)]
#[command(version, about = "datalyze")]
pub struct Args {
    /// Path to a comma-separated data file
    pub path: PathBuf,

    /// Action to perform: preview, table, summary, analyze_columns,
    /// analyze_rows or plot
    #[arg(long, default_value = "summary")]
    pub action: String,

    /// Select a column (repeat for multiple columns)
    #[arg(long = "column")]
    pub columns: Vec<String>,

    /// Row subset for analyze_rows: first_10, last_10 or all
    #[arg(long = "row-range")]
    pub row_range: Option<String>,

    /// Plot kind: histogram, boxplot, scatter, bar, pie, pairplot, heatmap.
    /// Implies --action plot
    #[arg(long)]
    pub plot: Option<String>,

    /// Write the rendered plot to this path instead of printing base64
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// First row of a table view
    #[arg(long = "start-row")]
    pub start_row: Option<usize>,

    /// Number of rows in a table view
    #[arg(long = "num-rows")]
    pub num_rows: Option<usize>,

    /// Fetch a single specific row index
    #[arg(long = "row")]
    pub specific_row: Option<usize>,

    /// Specify the delimiter to use when reading the file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Specify that the file has no header
    #[arg(long = "no-header", action)]
    pub no_header: bool,

    /// Skip this many rows when reading the file
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<usize>,

    /// Path to a config file (defaults to the user config directory)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}
