//! End-to-end growth-rate analysis: load, pivot, fit, moderate, tidy, analyse

use std::fs;
use std::path::PathBuf;

use log::info;

use crate::analysis::{
    adjust_by_group, intercepts_for_process, join_trends, separate, top_by_effect,
    GeneTermResult, ResultsSummary, TrendPoint,
};
use crate::data::{load_long_table, ExpressionMatrix, GeneSetTable, LoadParams, LongTable};
use crate::error::Result;
use crate::io::{write_glance, write_results, DEFAULT_SOURCE};
use crate::lm::{lm_fit, DesignMatrix, LmFitParams, RATE};
use crate::plot::{intercept_boxplot, pvalue_histograms, trend_plots, volcano_plots};
use crate::shrinkage::{ebayes, ModeratedFit};
use crate::testing::AdjustMethod;
use crate::tidy::{glance, tidy, Glance, TidyOptions, TidyRow};

/// Configurable parameters for a full run
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// URL or local path of the tab-delimited expression table
    pub source: String,
    /// Directory receiving tables and charts
    pub output_dir: PathBuf,
    pub load: LoadParams,
    pub fit: LmFitParams,
    /// Report the intercept term alongside the rate slope
    pub include_intercept: bool,
    pub adjust: AdjustMethod,
    /// Genes kept per nutrient when ranking by |slope|
    pub top_n: usize,
    pub alpha: f64,
    /// Biological process whose intercepts are charted
    pub process: String,
    /// Render SVG charts
    pub plots: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            output_dir: PathBuf::from("limma_results"),
            load: LoadParams::default(),
            fit: LmFitParams::default(),
            include_intercept: true,
            adjust: AdjustMethod::Fdr,
            top_n: 10,
            alpha: 0.05,
            process: "leucine biosynthesis".to_string(),
            plots: true,
        }
    }
}

/// Every artifact produced by a run
#[derive(Debug, Clone)]
pub struct PipelineResults {
    pub long: LongTable,
    pub matrix: ExpressionMatrix,
    pub fit: ModeratedFit,
    pub tidy: Vec<TidyRow>,
    /// Tidy rows with split keys and adjusted p-values
    pub results: Vec<GeneTermResult>,
    /// Top rate slopes per nutrient
    pub top: Vec<GeneTermResult>,
    /// Observations behind the top slopes
    pub trends: Vec<TrendPoint>,
    /// Intercepts of the genes in `PipelineParams::process`
    pub intercepts: Vec<GeneTermResult>,
    pub glance: Glance,
    pub summary: ResultsSummary,
}

/// Model an already-cleaned long table. No files are read or written.
pub fn analyze(long: LongTable, params: &PipelineParams) -> Result<PipelineResults> {
    info!("Building expression matrix...");
    let matrix = ExpressionMatrix::from_long(&long)?;
    info!(
        "  {} gene/nutrient rows x {} growth rates",
        matrix.n_rows(),
        matrix.n_samples()
    );

    let design = DesignMatrix::intercept_slope(matrix.design_vector())?;
    let linear = lm_fit(&matrix, &design, &params.fit)?;
    let fit = ebayes(&linear)?;

    info!("Tidying model output...");
    let tidy_rows = tidy(
        &fit,
        TidyOptions {
            intercept: params.include_intercept,
        },
    );
    let mut results = separate(&tidy_rows)?;
    adjust_by_group(&mut results, params.adjust);

    let top = top_by_effect(&results, RATE, params.top_n);
    let trends = join_trends(&top, &long);
    let genes = GeneSetTable::from_long(&long);
    let intercepts = intercepts_for_process(&results, &genes, &params.process);
    info!(
        "  {} top slopes, {} intercepts for '{}'",
        top.len(),
        intercepts.len(),
        params.process
    );

    let summary = ResultsSummary::new(&results, params.alpha);
    let glance = glance(&fit);

    Ok(PipelineResults {
        long,
        matrix,
        fit,
        tidy: tidy_rows,
        results,
        top,
        trends,
        intercepts,
        glance,
        summary,
    })
}

/// Write tables and, if enabled, charts into `params.output_dir`
pub fn write_outputs(results: &PipelineResults, params: &PipelineParams) -> Result<()> {
    let dir = &params.output_dir;
    fs::create_dir_all(dir)?;

    write_results(dir.join("tidy.tsv"), &results.results)?;
    write_results(dir.join("top.tsv"), &results.top)?;
    write_glance(dir.join("glance.json"), &results.glance)?;
    info!("Tables written to {}", dir.display());

    if params.plots {
        pvalue_histograms(dir.join("pvalue_histograms.svg"), &results.results)?;
        volcano_plots(dir.join("volcano.svg"), &results.results, RATE, params.alpha)?;
        intercept_boxplot(dir.join("intercepts.svg"), &results.intercepts, &params.process)?;
        trend_plots(dir.join("trends.svg"), &results.trends)?;
    }
    Ok(())
}

/// Run the complete pipeline from `params.source` to files in `params.output_dir`
pub fn run_pipeline(params: &PipelineParams) -> Result<PipelineResults> {
    info!("Loading expression data from {}...", params.source);
    let long = load_long_table(&params.source, &params.load)?;

    let results = analyze(long, params)?;
    write_outputs(&results, params)?;
    Ok(results)
}
