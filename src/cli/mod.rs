//! Command-line interface for rust_limma

use clap::{Parser, Subcommand};

use crate::io::DEFAULT_SOURCE;

#[derive(Parser)]
#[command(name = "rust_limma")]
#[command(version)]
#[command(about = "Growth-rate linear models of yeast gene expression")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit, moderate and analyse expression against growth rate
    #[command(
        about = "Fit, moderate and analyse expression against growth rate",
        long_about = "Fit, moderate and analyse expression against growth rate\n\n\
            Loads the expression table, keeps gene/nutrient groups with a full set of\n\
            replicates, fits expression ~ rate for every gene under every nutrient,\n\
            moderates the residual variances with an empirical Bayes prior and writes\n\
            tidy results, top hits, a model summary and SVG charts.",
        after_long_help = "\
Examples:
  # Download the Brauer 2008 table and analyse it
  rust_limma run -o results

  # Local copy, top 20 slopes per nutrient, Bonferroni correction
  rust_limma run -s Brauer2008_DataSet1.tds --top 20 --adjust bonferroni

  # Slopes only, no charts
  rust_limma run -s data.tds --no-intercept --no-plots"
    )]
    Run {
        /// URL or path of the tab-delimited expression table
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        source: String,

        /// Output directory [default: limma_results]
        #[arg(short, long, default_value = "limma_results")]
        output: String,

        /// Replicates required per gene/nutrient group [default: 6]
        #[arg(short, long, default_value = "6")]
        replicates: usize,

        /// Report only the rate slope, not the intercept
        #[arg(long)]
        no_intercept: bool,

        /// Genes kept per nutrient when ranking by |slope| [default: 10]
        #[arg(long, default_value = "10")]
        top: usize,

        /// P-value adjustment within each term/nutrient group [default: fdr]
        #[arg(long, default_value = "fdr",
            long_help = "P-value adjustment applied within each term/nutrient group.\n\
                fdr:        Benjamini-Hochberg (alias: bh)\n\
                bonferroni: Bonferroni\n\
                none:       No adjustment")]
        adjust: String,

        /// Significance threshold on adjusted p-values [default: 0.05]
        #[arg(short, long, default_value = "0.05")]
        alpha: f64,

        /// Biological process whose intercepts are charted
        #[arg(short, long, default_value = "leucine biosynthesis")]
        process: String,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Skip SVG charts
        #[arg(long)]
        no_plots: bool,
    },

    /// Load and clean the expression table only
    #[command(
        long_about = "Load and clean the expression table.\n\n\
            Writes the long-form table (one row per gene, nutrient and growth rate)\n\
            after splitting annotations and dropping incomplete groups.",
        after_long_help = "\
Examples:
  rust_limma clean -o cleaned.tsv
  rust_limma clean -s Brauer2008_DataSet1.tds -o cleaned.tsv"
    )]
    Clean {
        /// URL or path of the tab-delimited expression table
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        source: String,

        /// Output file path [default: cleaned.tsv]
        #[arg(short, long, default_value = "cleaned.tsv")]
        output: String,

        /// Replicates required per gene/nutrient group [default: 6]
        #[arg(short, long, default_value = "6")]
        replicates: usize,
    },
}
