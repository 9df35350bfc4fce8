//! Chart rendering: the plot catalog drawn with plotters' bitmap backend
//! and encoded to PNG in memory.
//!
//! Every render draws into a fresh call-scoped pixel buffer; no drawing
//! state survives a request, success or failure.

use crate::config::ChartConfig;
use crate::dataset::{is_categorical_dtype, is_numeric_dtype, numeric_values, Dataset};
use crate::error::{AnalysisError, Result};
use crate::request::{PlotKind, PlotSpec};
use crate::statistics;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use polars::prelude::DataType;

const PALETTE: [RGBColor; 7] = [
    CYAN,
    MAGENTA,
    GREEN,
    YELLOW,
    BLUE,
    RED,
    RGBColor(128, 255, 255),
];

/// Call-scoped drawing surface. The pixel buffer lives and dies with one
/// render; [`encode_png`] consumes it.
///
/// [`encode_png`]: Canvas::encode_png
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![255u8; (width * height * 3) as usize],
        }
    }

    fn encode_png(self) -> Result<Vec<u8>> {
        let image = image::RgbImage::from_raw(self.width, self.height, self.pixels)
            .ok_or_else(|| AnalysisError::Render("pixel buffer size mismatch".to_string()))?;
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| AnalysisError::Render(e.to_string()))?;
        Ok(bytes)
    }
}

fn to_render_err<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::Render(e.to_string())
}

/// Render a validated plot request against the dataset, returning PNG bytes.
pub fn render(dataset: &Dataset, spec: &PlotSpec, config: &ChartConfig) -> Result<Vec<u8>> {
    log::debug!(
        "rendering {} over {:?} ({}x{})",
        spec.kind.as_str(),
        spec.columns,
        config.width,
        config.height
    );
    let mut canvas = Canvas::new(config.width, config.height);
    {
        let root = BitMapBackend::with_buffer(&mut canvas.pixels, (config.width, config.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(to_render_err)?;
        match spec.kind {
            PlotKind::Histogram => draw_histogram(&root, dataset, &spec.columns[0], config)?,
            PlotKind::Boxplot => draw_boxplot(&root, dataset, &spec.columns)?,
            PlotKind::Scatter => {
                draw_scatter(&root, dataset, &spec.columns[0], &spec.columns[1])?
            }
            PlotKind::Bar => draw_bar(&root, dataset, &spec.columns[0])?,
            PlotKind::Pie => draw_pie(&root, dataset, &spec.columns[0])?,
            PlotKind::Pairplot => draw_pairplot(&root, dataset)?,
            PlotKind::Heatmap => draw_heatmap(&root, dataset)?,
        }
        root.present().map_err(to_render_err)?;
    }
    canvas.encode_png()
}

/// Non-null values of a numeric column, or a render error naming the
/// mismatch when the column is the wrong kind or empty.
fn numeric_column(dataset: &Dataset, name: &str) -> Result<Vec<f64>> {
    let column = dataset.frame().column(name)?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(AnalysisError::Render(format!(
            "column '{}' is not numeric",
            name
        )));
    }
    let values = numeric_values(column.as_materialized_series());
    if values.is_empty() {
        return Err(AnalysisError::Render(format!(
            "column '{}' has no data to plot",
            name
        )));
    }
    Ok(values)
}

/// Value frequencies of a categorical column, most frequent first.
fn categorical_column(dataset: &Dataset, name: &str) -> Result<Vec<(String, usize)>> {
    let column = dataset.frame().column(name)?;
    if !is_categorical_dtype(column.dtype()) {
        return Err(AnalysisError::Render(format!(
            "column '{}' is not categorical",
            name
        )));
    }
    let counts = statistics::str_value_counts(column.as_materialized_series())?;
    if counts.is_empty() {
        return Err(AnalysisError::Render(format!(
            "column '{}' has no data to plot",
            name
        )));
    }
    Ok(counts)
}

/// Row-aligned (x, y) pairs of two numeric columns, dropping rows where
/// either side is null or non-finite.
fn paired_numeric(dataset: &Dataset, x: &str, y: &str) -> Result<Vec<(f64, f64)>> {
    for name in [x, y] {
        let column = dataset.frame().column(name)?;
        if !is_numeric_dtype(column.dtype()) {
            return Err(AnalysisError::Render(format!(
                "column '{}' is not numeric",
                name
            )));
        }
    }
    let xs = dataset
        .frame()
        .column(x)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let ys = dataset
        .frame()
        .column(y)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let pairs = xs
        .f64()?
        .iter()
        .zip(ys.f64()?.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((a, b)),
            _ => None,
        })
        .collect();
    Ok(pairs)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

/// Gaussian kernel density estimate on an evenly spaced grid, Silverman
/// bandwidth.
fn gaussian_kde(values: &[f64], grid_points: usize) -> Vec<(f64, f64)> {
    if values.is_empty() || grid_points < 2 {
        return Vec::new();
    }
    let n = values.len() as f64;
    let (_, std) = mean_and_std(values);
    let mut bandwidth = 1.06 * std * n.powf(-0.2);
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        bandwidth = 1.0;
    }
    let (lo, hi) = bounds(values.iter().copied());
    let start = lo - 3.0 * bandwidth;
    let stop = hi + 3.0 * bandwidth;
    let step = (stop - start) / (grid_points - 1) as f64;
    let norm = n * bandwidth * (2.0 * std::f64::consts::PI).sqrt();
    (0..grid_points)
        .map(|i| {
            let x = start + i as f64 * step;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                / norm;
            (x, density)
        })
        .collect()
}

fn segment_label(value: &SegmentValue<usize>, names: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) if *i < names.len() => names[*i].clone(),
        _ => String::new(),
    }
}

/// Diverging blue→white→red scale over [-1, 1].
fn heat_color(value: f64) -> RGBColor {
    if !value.is_finite() {
        return RGBColor(221, 221, 221);
    }
    let v = value.clamp(-1.0, 1.0);
    let ((r0, g0, b0), (r1, g1, b1), t) = if v < 0.0 {
        ((59.0, 76.0, 192.0), (221.0, 221.0, 221.0), v + 1.0)
    } else {
        ((221.0, 221.0, 221.0), (180.0, 4.0, 38.0), v)
    };
    RGBColor(
        (r0 + (r1 - r0) * t) as u8,
        (g0 + (g1 - g0) * t) as u8,
        (b0 + (b1 - b0) * t) as u8,
    )
}

fn draw_histogram(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    dataset: &Dataset,
    column: &str,
    config: &ChartConfig,
) -> Result<()> {
    let values = numeric_column(dataset, column)?;
    let (min, max) = bounds(values.iter().copied());
    let bins = config.histogram_bins.max(1);
    let bin_width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in &values {
        let idx = (((v - min) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let y_max = counts.iter().copied().max().unwrap_or(1).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(root)
        .caption(format!("Distribution of {}", column), ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(min..max, 0.0..y_max)
        .map_err(to_render_err)?;
    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("count")
        .draw()
        .map_err(to_render_err)?;

    chart
        .draw_series((0..bins).map(|i| {
            let x0 = min + i as f64 * bin_width;
            Rectangle::new(
                [(x0, 0.0), (x0 + bin_width, counts[i] as f64)],
                BLUE.mix(0.4).filled(),
            )
        }))
        .map_err(to_render_err)?;

    // Density overlay scaled to the bar counts.
    let scale = values.len() as f64 * bin_width;
    chart
        .draw_series(LineSeries::new(
            gaussian_kde(&values, 200)
                .into_iter()
                .map(|(x, d)| (x, d * scale)),
            RED.stroke_width(2),
        ))
        .map_err(to_render_err)?;
    Ok(())
}

fn draw_boxplot(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    dataset: &Dataset,
    columns: &[String],
) -> Result<()> {
    let mut quartiles = Vec::with_capacity(columns.len());
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for name in columns {
        let values = numeric_column(dataset, name)?;
        let (v_lo, v_hi) = bounds(values.iter().copied());
        lo = lo.min(v_lo);
        hi = hi.max(v_hi);
        quartiles.push(Quartiles::new(&values));
    }
    let pad = ((hi - lo) * 0.1).max(1e-6);
    let y_range = (lo - pad) as f32..(hi + pad) as f32;

    let mut chart = ChartBuilder::on(root)
        .caption("Box Plot", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(55)
        .build_cartesian_2d((0..columns.len()).into_segmented(), y_range)
        .map_err(to_render_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(columns.len() + 1)
        .x_label_formatter(&|v| segment_label(v, columns))
        .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
        .draw()
        .map_err(to_render_err)?;

    chart
        .draw_series(quartiles.iter().enumerate().map(|(i, q)| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i), q)
                .width(25)
                .whisker_width(0.5)
                .style(PALETTE[i % PALETTE.len()])
        }))
        .map_err(to_render_err)?;
    Ok(())
}

fn draw_scatter(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    dataset: &Dataset,
    x_column: &str,
    y_column: &str,
) -> Result<()> {
    let pairs = paired_numeric(dataset, x_column, y_column)?;
    if pairs.is_empty() {
        return Err(AnalysisError::Render("no data to plot".to_string()));
    }
    let (x_lo, x_hi) = bounds(pairs.iter().map(|p| p.0));
    let (y_lo, y_hi) = bounds(pairs.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("{} vs {}", x_column, y_column),
            ("sans-serif", 28),
        )
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(to_render_err)?;
    chart
        .configure_mesh()
        .x_desc(x_column)
        .y_desc(y_column)
        .draw()
        .map_err(to_render_err)?;

    chart
        .draw_series(
            pairs
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
        )
        .map_err(to_render_err)?;
    Ok(())
}

fn draw_bar(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    dataset: &Dataset,
    column: &str,
) -> Result<()> {
    let counts = categorical_column(dataset, column)?;
    let labels: Vec<String> = counts.iter().map(|(value, _)| value.clone()).collect();
    let y_max = counts.iter().map(|(_, n)| *n).max().unwrap_or(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(root)
        .caption(format!("Bar Plot of {}", column), ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(55)
        .build_cartesian_2d((0..counts.len()).into_segmented(), 0.0..y_max)
        .map_err(to_render_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len() + 1)
        .x_label_formatter(&|v| segment_label(v, &labels))
        .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
        .y_desc("count")
        .draw()
        .map_err(to_render_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, (_, n))| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), *n as f64),
                ],
                PALETTE[i % PALETTE.len()].mix(0.8).filled(),
            )
        }))
        .map_err(to_render_err)?;
    Ok(())
}

fn draw_pie(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    dataset: &Dataset,
    column: &str,
) -> Result<()> {
    let counts = categorical_column(dataset, column)?;
    let area = root
        .titled(
            &format!("Pie Chart of {}", column),
            ("sans-serif", 28),
        )
        .map_err(to_render_err)?;
    let (width, height) = area.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);
    let radius = (width.min(height) as f64) * 0.35;
    let sizes: Vec<f64> = counts.iter().map(|(_, n)| *n as f64).collect();
    let labels: Vec<String> = counts.iter().map(|(value, _)| value.clone()).collect();
    let colors: Vec<RGBColor> = (0..counts.len())
        .map(|i| PALETTE[i % PALETTE.len()])
        .collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 18).into_font());
    pie.percentages(("sans-serif", 16).into_font().color(&BLACK));
    area.draw(&pie).map_err(to_render_err)?;
    Ok(())
}

fn draw_pairplot(root: &DrawingArea<BitMapBackend<'_>, Shift>, dataset: &Dataset) -> Result<()> {
    let numeric = dataset.classify().numeric;
    if numeric.is_empty() {
        return Err(AnalysisError::Render(
            "no numeric columns to plot".to_string(),
        ));
    }
    let n = numeric.len();
    let panels = root.split_evenly((n, n));

    for (idx, panel) in panels.iter().enumerate() {
        let row = idx / n;
        let col = idx % n;
        if row == col {
            let values = numeric_column(dataset, &numeric[row])?;
            let density = gaussian_kde(&values, 120);
            let (x_lo, x_hi) = bounds(density.iter().map(|p| p.0));
            let d_max = density.iter().map(|p| p.1).fold(0.0_f64, f64::max);
            let mut chart = ChartBuilder::on(panel)
                .caption(&numeric[row], ("sans-serif", 16))
                .margin(6)
                .x_label_area_size(18)
                .y_label_area_size(24)
                .build_cartesian_2d(x_lo..x_hi, 0.0..(d_max * 1.1).max(1e-9))
                .map_err(to_render_err)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(3)
                .y_labels(3)
                .draw()
                .map_err(to_render_err)?;
            chart
                .draw_series(LineSeries::new(density, BLUE.stroke_width(2)))
                .map_err(to_render_err)?;
        } else {
            let pairs = paired_numeric(dataset, &numeric[col], &numeric[row])?;
            let (x_lo, x_hi) = bounds(pairs.iter().map(|p| p.0));
            let (y_lo, y_hi) = bounds(pairs.iter().map(|p| p.1));
            let mut chart = ChartBuilder::on(panel)
                .margin(6)
                .x_label_area_size(18)
                .y_label_area_size(24)
                .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
                .map_err(to_render_err)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(3)
                .y_labels(3)
                .draw()
                .map_err(to_render_err)?;
            chart
                .draw_series(
                    pairs
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 2, BLUE.mix(0.7).filled())),
                )
                .map_err(to_render_err)?;
        }
    }
    Ok(())
}

fn draw_heatmap(root: &DrawingArea<BitMapBackend<'_>, Shift>, dataset: &Dataset) -> Result<()> {
    let Some((names, matrix)) = statistics::correlation_values(dataset)? else {
        return Err(AnalysisError::Render(
            "need at least 2 numeric columns for a correlation heatmap".to_string(),
        ));
    };
    let n = names.len();

    let mut chart = ChartBuilder::on(root)
        .caption("Correlation Heatmap", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())
        .map_err(to_render_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&|v| segment_label(v, &names))
        .y_label_formatter(&|v| segment_label(v, &names))
        .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
        .draw()
        .map_err(to_render_err)?;

    let matrix_ref = &matrix;
    chart
        .draw_series((0..n).flat_map(|i| {
            (0..n).map(move |j| {
                Rectangle::new(
                    [
                        (SegmentValue::Exact(j), SegmentValue::Exact(i)),
                        (SegmentValue::Exact(j + 1), SegmentValue::Exact(i + 1)),
                    ],
                    heat_color(matrix_ref[i][j]).filled(),
                )
            })
        }))
        .map_err(to_render_err)?;

    let annotation = ("sans-serif", 16)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    let annotation_ref = &annotation;
    chart
        .draw_series((0..n).flat_map(|i| {
            (0..n).map(move |j| {
                Text::new(
                    format!("{:.2}", matrix_ref[i][j]),
                    (SegmentValue::CenterOf(j), SegmentValue::CenterOf(i)),
                    annotation_ref.clone(),
                )
            })
        }))
        .map_err(to_render_err)?;
    Ok(())
}
