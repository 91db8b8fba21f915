use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stream_benchmark_report::benchmark_utils::read_benchmark_results;
use stream_benchmark_report::config::{init_logging, ReportConfig, DEFAULT_EXE, DEFAULT_OUTPUT_DIR};
use stream_benchmark_report::report::build_report;

/// Rebuild the charts and slide deck from a saved results table, without running any benchmark.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// A benchmark_results.csv written by benchmark_report
    results: PathBuf,

    /// Directory for the images and deck
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let results = read_benchmark_results(&args.results)
        .with_context(|| format!("reading results table {}", args.results.display()))?;
    println!("Loaded {} records from {}", results.len(), args.results.display());

    let config = ReportConfig::new(DEFAULT_EXE, args.output_dir, None);
    config.prepare_output_dir()?;
    let outcome = build_report(results, &config).context("rendering report")?;

    if let Some((path, summary)) = outcome.deck {
        println!(
            "\nPowerPoint file created: {} ({} slides, {} images)",
            path.display(),
            summary.slides,
            summary.images
        );
    }

    Ok(())
}
