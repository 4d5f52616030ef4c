//! SVG charts of analysed results
//!
//! Every chart is a grid of facets drawn with plotters' SVG backend. A chart
//! with nothing to draw is skipped with a log line instead of writing an empty
//! file.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::analysis::{GeneTermResult, TrendPoint};
use crate::data::Nutrient;
use crate::error::{LimmaError, Result};
use crate::stats::five_number_summary;

/// Pixel size of one facet
const FACET_SIZE: (u32, u32) = (340, 260);
const HISTOGRAM_BINS: usize = 20;
const FACET_COLUMNS: usize = 3;

type Facet<'a> = DrawingArea<SVGBackend<'a>, Shift>;

fn plot_err<E: Display>(e: E) -> LimmaError {
    LimmaError::PlotFailed {
        reason: e.to_string(),
    }
}

/// Finite extent of the values, widened by 5% (or by 0.5 when flat)
fn padded_range(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    Some(lo - pad..hi + pad)
}

fn nutrients_of(nutrients: impl Iterator<Item = Nutrient>) -> Vec<Nutrient> {
    nutrients.collect::<BTreeSet<_>>().into_iter().collect()
}

/// Terms in first-appearance order
fn terms_of(rows: &[GeneTermResult]) -> Vec<&str> {
    let mut terms: Vec<&str> = Vec::new();
    for row in rows {
        if !terms.contains(&row.term.as_str()) {
            terms.push(&row.term);
        }
    }
    terms
}

/// White canvas split into `rows` x `cols` facets
fn facet_grid<'a>(path: &'a Path, rows: usize, cols: usize) -> Result<(Facet<'a>, Vec<Facet<'a>>)> {
    let root = SVGBackend::new(
        path,
        (FACET_SIZE.0 * cols as u32, FACET_SIZE.1 * rows as u32),
    )
    .into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let facets = root.split_evenly((rows, cols));
    Ok((root, facets))
}

/// Facet layout for one facet per nutrient
fn nutrient_grid(n: usize) -> (usize, usize) {
    let cols = n.clamp(1, FACET_COLUMNS);
    (n.div_ceil(cols).max(1), cols)
}

fn draw_histogram(area: &Facet<'_>, title: &str, pvalues: &[f64]) -> Result<()> {
    let mut bins = [0usize; HISTOGRAM_BINS];
    for &p in pvalues.iter().filter(|p| p.is_finite()) {
        let idx = ((p.max(0.0) * HISTOGRAM_BINS as f64).floor() as usize).min(HISTOGRAM_BINS - 1);
        bins[idx] += 1;
    }
    let max_bin = bins.iter().copied().max().unwrap_or(0).max(1) as f64;
    let width = 1.0 / HISTOGRAM_BINS as f64;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(title, ("sans-serif", 14))
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..1.0, 0.0..max_bin * 1.05)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("p.value")
        .y_desc("count")
        .x_labels(5)
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(bins.iter().enumerate().map(|(i, &count)| {
            let x0 = i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(plot_err)?;
    Ok(())
}

/// P-value histograms, one row of facets per term and one column per nutrient
pub fn pvalue_histograms<P: AsRef<Path>>(path: P, rows: &[GeneTermResult]) -> Result<()> {
    if rows.is_empty() {
        info!("No results; skipping p-value histograms");
        return Ok(());
    }
    let terms = terms_of(rows);
    let nutrients = nutrients_of(rows.iter().map(|r| r.nutrient));

    let (root, facets) = facet_grid(path.as_ref(), terms.len(), nutrients.len())?;
    for (i, term) in terms.iter().enumerate() {
        for (j, nutrient) in nutrients.iter().enumerate() {
            let pvalues: Vec<f64> = rows
                .iter()
                .filter(|r| r.term == *term && r.nutrient == *nutrient)
                .map(|r| r.p_value)
                .collect();
            let title = format!("{} | {}", term, nutrient);
            draw_histogram(&facets[i * nutrients.len() + j], &title, &pvalues)?;
        }
    }
    root.present().map_err(plot_err)?;

    info!("P-value histograms saved: {}", path.as_ref().display());
    Ok(())
}

fn neg_log10(p: f64) -> f64 {
    -p.max(f64::MIN_POSITIVE).log10()
}

/// Estimate against -log10(p) for one term, one facet per nutrient.
/// Rows with adjusted p below `alpha` are drawn in red.
pub fn volcano_plots<P: AsRef<Path>>(
    path: P,
    rows: &[GeneTermResult],
    term: &str,
    alpha: f64,
) -> Result<()> {
    let selected: Vec<&GeneTermResult> = rows
        .iter()
        .filter(|r| r.term == term && r.estimate.is_finite() && r.p_value.is_finite())
        .collect();
    if selected.is_empty() {
        info!("No '{}' results; skipping volcano plots", term);
        return Ok(());
    }
    let nutrients = nutrients_of(selected.iter().map(|r| r.nutrient));
    let (n_rows, n_cols) = nutrient_grid(nutrients.len());

    let (root, facets) = facet_grid(path.as_ref(), n_rows, n_cols)?;
    for (area, nutrient) in facets.iter().zip(nutrients.iter()) {
        let points: Vec<(f64, f64, bool)> = selected
            .iter()
            .filter(|r| r.nutrient == *nutrient)
            .map(|r| (r.estimate, neg_log10(r.p_value), r.p_adjusted < alpha))
            .collect();
        let (Some(x_range), Some(y_range)) = (
            padded_range(points.iter().map(|p| p.0)),
            padded_range(points.iter().map(|p| p.1)),
        ) else {
            continue;
        };

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .caption(nutrient.to_string(), ("sans-serif", 14))
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, y_range)
            .map_err(plot_err)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("estimate")
            .y_desc("-log10(p.value)")
            .draw()
            .map_err(plot_err)?;
        chart
            .draw_series(points.iter().map(|&(x, y, hit)| {
                let color = if hit { RED.mix(0.8) } else { BLACK.mix(0.4) };
                Circle::new((x, y), 2, color.filled())
            }))
            .map_err(plot_err)?;
    }
    root.present().map_err(plot_err)?;

    info!("Volcano plots saved: {}", path.as_ref().display());
    Ok(())
}

/// Box plot of intercept estimates per nutrient with the individual genes overlaid
pub fn intercept_boxplot<P: AsRef<Path>>(
    path: P,
    rows: &[GeneTermResult],
    title: &str,
) -> Result<()> {
    let Some(y_range) = padded_range(rows.iter().map(|r| r.estimate)) else {
        info!("No intercepts for '{}'; skipping box plot", title);
        return Ok(());
    };
    let nutrients = nutrients_of(rows.iter().map(|r| r.nutrient));
    let n = nutrients.len();

    let root = SVGBackend::new(path.as_ref(), (140 * n as u32 + 160, 420)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let label = |x: &f64| {
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < n {
            nutrients[i as usize].to_string()
        } else {
            String::new()
        }
    };

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .caption(title, ("sans-serif", 18))
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_range)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label)
        .y_desc("intercept")
        .draw()
        .map_err(plot_err)?;

    for (i, nutrient) in nutrients.iter().enumerate() {
        let estimates: Vec<f64> = rows
            .iter()
            .filter(|r| r.nutrient == *nutrient)
            .map(|r| r.estimate)
            .collect();
        let Some([min, q1, med, q3, max]) = five_number_summary(&estimates) else {
            continue;
        };
        let x = i as f64;
        let stroke = BLACK.stroke_width(1);

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.3, q1), (x + 0.3, q3)],
                BLUE.mix(0.15).filled(),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new([(x - 0.3, q1), (x + 0.3, q3)], stroke)))
            .map_err(plot_err)?;
        chart
            .draw_series(
                [
                    vec![(x - 0.3, med), (x + 0.3, med)],
                    vec![(x, min), (x, q1)],
                    vec![(x, q3), (x, max)],
                ]
                .into_iter()
                .map(|segment| PathElement::new(segment, BLACK.stroke_width(2))),
            )
            .map_err(plot_err)?;
        chart
            .draw_series(estimates.iter().enumerate().map(|(k, &y)| {
                let offset = ((k % 7) as f64 - 3.0) * 0.04;
                Circle::new((x + offset, y), 3, RED.mix(0.6).filled())
            }))
            .map_err(plot_err)?;
    }
    root.present().map_err(plot_err)?;

    info!("Intercept box plot saved: {}", path.as_ref().display());
    Ok(())
}

/// Expression against growth rate, one line per gene, one facet per nutrient
pub fn trend_plots<P: AsRef<Path>>(path: P, points: &[TrendPoint]) -> Result<()> {
    let (Some(x_range), Some(y_range)) = (
        padded_range(points.iter().map(|p| p.rate)),
        padded_range(points.iter().map(|p| p.expression)),
    ) else {
        info!("No trend points; skipping trend plots");
        return Ok(());
    };
    let nutrients = nutrients_of(points.iter().map(|p| p.nutrient));
    let (n_rows, n_cols) = nutrient_grid(nutrients.len());

    let (root, facets) = facet_grid(path.as_ref(), n_rows, n_cols)?;
    for (area, nutrient) in facets.iter().zip(nutrients.iter()) {
        let mut genes: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for p in points.iter().filter(|p| p.nutrient == *nutrient) {
            genes
                .entry(p.systematic_name.as_str())
                .or_default()
                .push((p.rate, p.expression));
        }

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .caption(nutrient.to_string(), ("sans-serif", 14))
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(plot_err)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("growth rate")
            .y_desc("expression")
            .draw()
            .map_err(plot_err)?;

        for (k, (_, mut series)) in genes.into_iter().enumerate() {
            series.sort_by(|a, b| a.0.total_cmp(&b.0));
            let color = Palette99::pick(k);
            chart
                .draw_series(LineSeries::new(series.clone(), color.stroke_width(1)))
                .map_err(plot_err)?;
            chart
                .draw_series(series.iter().map(|&(x, y)| Circle::new((x, y), 2, color.filled())))
                .map_err(plot_err)?;
        }
    }
    root.present().map_err(plot_err)?;

    info!("Trend plots saved: {}", path.as_ref().display());
    Ok(())
}
