use base64::Engine as _;
use clap::Parser;
use color_eyre::Result;
use datalyze::{service, Args, AppConfig, ConfigManager, Dataset, LoadOptions, Params};

fn load_options(args: &Args) -> LoadOptions {
    let mut opts = LoadOptions::new();
    if let Some(delimiter) = args.delimiter {
        opts = opts.with_delimiter(delimiter);
    }
    if args.no_header {
        opts = opts.with_has_header(false);
    }
    if let Some(skip_rows) = args.skip_rows {
        opts = opts.with_skip_rows(skip_rows);
    }
    opts
}

fn build_params(args: &Args) -> Params {
    let mut params = Params::new();
    let action = if args.plot.is_some() {
        "plot"
    } else {
        args.action.as_str()
    };
    params.insert("action", action);
    if let Some(plot) = &args.plot {
        params.insert("plot_type", plot);
    }
    for column in &args.columns {
        params.insert("columns", column);
    }
    if let Some(row_range) = &args.row_range {
        params.insert("row_range", row_range);
    }
    if let Some(start_row) = args.start_row {
        params.insert("start_row", &start_row.to_string());
    }
    if let Some(num_rows) = args.num_rows {
        params.insert("num_rows", &num_rows.to_string());
    }
    if let Some(specific_row) = args.specific_row {
        params.insert("specific_row", &specific_row.to_string());
    }
    params
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::load(&ConfigManager::new(datalyze::APP_NAME)?)?,
    };

    let dataset = Dataset::from_csv_path(&args.path, &load_options(args))?;
    let params = build_params(args);

    match service::dispatch(Some(&dataset), &params, &config) {
        Ok(reply) => {
            if let (Some(out), Some(encoded)) = (&args.out, &reply.plot_base64) {
                let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
                std::fs::write(out, bytes)?;
                println!("wrote {}", out.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            }
            Ok(())
        }
        Err(err) => {
            let body = service::ErrorBody::from(&err);
            eprintln!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;
    let args = Args::parse();
    run(&args)
}
