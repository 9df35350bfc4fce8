use color_eyre::Result;
use datalyze::{dispatch, AnalysisError, AppConfig, Dataset, LoadOptions, Params};
use polars::prelude::*;
use std::io::Write;

fn dataset() -> Dataset {
    let df = df!(
        "age" => &[Some(34i64), None, Some(29), Some(41)],
        "score" => &[88.0f64, 92.5, 75.0, 66.25],
        "city" => &["Oslo", "Lima", "Pune", "Oslo"],
    )
    .unwrap();
    Dataset::new(df)
}

fn params(pairs: &[(&str, &str)]) -> Params {
    let mut params = Params::new();
    for (key, value) in pairs {
        params.insert(key, value);
    }
    params
}

#[test]
fn requests_before_load_are_rejected() {
    let err = dispatch(None, &params(&[("action", "summary")]), &AppConfig::default())
        .unwrap_err();
    assert!(matches!(err, AnalysisError::NoActiveDataset));
}

#[test]
fn summary_returns_all_four_artifacts() -> Result<()> {
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "summary")]),
        &AppConfig::default(),
    )?;
    assert!(reply.numerical.as_deref().unwrap().contains("<table"));
    assert!(reply.categorical.as_deref().unwrap().contains("<table"));
    assert!(reply.correlation.as_deref().unwrap().contains("<table"));
    assert!(reply.missing_values.as_deref().unwrap().contains("<table"));
    assert_eq!(reply.total_rows, Some(4));
    Ok(())
}

#[test]
fn analyze_columns_omits_correlation() -> Result<()> {
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "analyze_columns"), ("columns", "age")]),
        &AppConfig::default(),
    )?;
    assert!(reply.numerical.is_some());
    assert!(reply.missing_values.is_some());
    assert!(reply.correlation.is_none());
    Ok(())
}

#[test]
fn analyze_columns_rejects_unknown() {
    let err = dispatch(
        Some(&dataset()),
        &params(&[("action", "analyze_columns"), ("columns", "height")]),
        &AppConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownColumn(name) if name == "height"));
}

#[test]
fn analyze_rows_windows_before_computing() -> Result<()> {
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "analyze_rows"), ("row_range", "first_10")]),
        &AppConfig::default(),
    )?;
    assert!(reply.numerical.as_deref().unwrap().contains("<table"));
    Ok(())
}

#[test]
fn table_view_paginates_and_keeps_source_row_labels() -> Result<()> {
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "table"), ("start_row", "2"), ("num_rows", "2")]),
        &AppConfig::default(),
    )?;
    let html = reply.data.unwrap();
    assert!(html.contains("<th>2</th>"));
    assert!(html.contains("<th>3</th>"));
    assert!(!html.contains("<th>0</th>"));
    assert_eq!(reply.total_rows, Some(4));
    Ok(())
}

#[test]
fn table_view_out_of_range_window_is_empty_not_an_error() -> Result<()> {
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "table"), ("start_row", "100")]),
        &AppConfig::default(),
    )?;
    let html = reply.data.unwrap();
    assert!(!html.contains("<td>"));
    Ok(())
}

#[test]
fn table_view_renders_nulls_as_nan() -> Result<()> {
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "table")]),
        &AppConfig::default(),
    )?;
    assert!(reply.data.unwrap().contains("<td>NaN</td>"));
    Ok(())
}

#[test]
fn specific_row_out_of_range_is_an_error() {
    let err = dispatch(
        Some(&dataset()),
        &params(&[("action", "table"), ("specific_row", "4")]),
        &AppConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::RowIndexOutOfRange { index: 4, row_count: 4 }));
}

#[test]
fn plot_reply_carries_base64_png() -> Result<()> {
    use base64::Engine as _;
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "plot"), ("plot_type", "scatter"), ("columns", "age"),
                  ("columns", "score")]),
        &AppConfig::default(),
    )?;
    let encoded = reply.plot_base64.expect("plot payload");
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    Ok(())
}

#[test]
fn heatmap_ignores_explicit_column_selection() -> Result<()> {
    // Even a selection naming a single (or unknown) column still renders the
    // full correlation heatmap over all numeric columns.
    let reply = dispatch(
        Some(&dataset()),
        &params(&[("action", "plot"), ("plot_type", "heatmap"), ("columns", "age")]),
        &AppConfig::default(),
    )?;
    assert!(reply.plot_base64.is_some());
    Ok(())
}

#[test]
fn preview_matches_upload_flow() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.csv");
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "age,city")?;
    writeln!(file, "31,Oslo")?;
    writeln!(file, "42,Lima")?;

    let dataset = Dataset::from_csv_path(&path, &LoadOptions::new())?;
    let reply = dispatch(
        Some(&dataset),
        &params(&[("action", "preview")]),
        &AppConfig::default(),
    )?;
    let html = reply.data.unwrap();
    assert!(html.contains("<th>age</th>"));
    assert!(html.contains("<td>Oslo</td>"));
    assert_eq!(reply.total_rows, Some(2));
    Ok(())
}

#[test]
fn error_bodies_serialize_with_codes() {
    let err = dispatch(None, &params(&[("action", "summary")]), &AppConfig::default())
        .unwrap_err();
    let body = datalyze::ErrorBody::from(&err);
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["code"], "no_active_dataset");
    assert!(json["error"].as_str().unwrap().contains("no dataset"));
}
