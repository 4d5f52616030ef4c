//! rust_limma command-line interface

use std::path::PathBuf;

use clap::Parser;
use log::{info, LevelFilter};

use rust_limma::cli::{Cli, Commands};
use rust_limma::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["run", "clean", "help"];
    let has_subcommand = first_positional.is_some_and(|a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        if args.len() == 1 {
            print_no_args();
            return;
        }
        if args.iter().any(|a| a == "--help") {
            print_long_help();
            return;
        }
        if args.iter().any(|a| a == "-h") {
            print_short_help();
            return;
        }
        if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("rust_limma {}", VERSION);
            return;
        }
        print_no_args();
        return;
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            source,
            output,
            replicates,
            no_intercept,
            top,
            adjust,
            alpha,
            process,
            threads,
            no_plots,
        }) => run_analysis(
            source,
            output,
            replicates,
            no_intercept,
            top,
            &adjust,
            alpha,
            process,
            threads,
            no_plots,
        ),
        Some(Commands::Clean {
            source,
            output,
            replicates,
        }) => run_clean(&source, &output, replicates),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("rust_limma v{}", VERSION);
    println!("Run `rust_limma -h` for usage or `rust_limma --help` for detailed information.");
}

fn print_short_help() {
    println!("rust_limma v{}", VERSION);
    println!();
    println!("Usage: rust_limma <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run    Fit and analyse expression against growth rate");
    println!("  clean  Load and clean the expression table only");
    println!();
    println!("Run `rust_limma <COMMAND> -h` for command-specific options.");
}

fn print_long_help() {
    println!("rust_limma v{}", VERSION);
    println!("Per-gene growth-rate models of yeast expression with empirical Bayes moderation");
    println!();
    println!("Usage: rust_limma <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run    Fit expression ~ growth rate per gene and nutrient");
    println!("           - Moderated t-statistics from an empirical Bayes variance prior");
    println!("           - P-values adjusted within each term/nutrient group");
    println!("           - Top slopes, gene-set intercepts and SVG charts");
    println!("  clean  Split annotations and write the long-form table");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h               Print short help");
    println!("      --help       Print detailed help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  rust_limma run -o results");
    println!();
    println!("  rust_limma run -s Brauer2008_DataSet1.tds --top 20 --adjust bonferroni");
    println!();
    println!("  rust_limma clean -s Brauer2008_DataSet1.tds -o cleaned.tsv");
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn run_analysis(
    source: String,
    output: String,
    replicates: usize,
    no_intercept: bool,
    top: usize,
    adjust: &str,
    alpha: f64,
    process: String,
    threads: usize,
    no_plots: bool,
) -> Result<()> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(LimmaError::InvalidInput {
            reason: format!("alpha must be in (0, 1), got {}", alpha),
        });
    }

    let params = PipelineParams {
        source,
        output_dir: PathBuf::from(output),
        load: LoadParams {
            expected_replicates: replicates,
        },
        include_intercept: !no_intercept,
        adjust: adjust.parse::<AdjustMethod>()?,
        top_n: top,
        alpha,
        process,
        plots: !no_plots,
        ..PipelineParams::default()
    };

    let results = run_pipeline(&params)?;

    println!();
    println!("{}", results.summary);
    println!(
        "Prior df: {:.3}, prior variance: {:.5}",
        results.fit.df_prior, results.fit.s2_prior
    );
    info!("Results written to {}", params.output_dir.display());
    Ok(())
}

fn run_clean(source: &str, output: &str, replicates: usize) -> Result<()> {
    info!("Loading expression data from {}...", source);
    let long = load_long_table(
        source,
        &LoadParams {
            expected_replicates: replicates,
        },
    )?;

    write_long_table(output, &long)?;
    info!("Cleaned table ({} records) written to {}", long.len(), output);
    Ok(())
}
