use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use stream_benchmark_report::config::{init_logging, ReportConfig, DEFAULT_EXE, DEFAULT_OUTPUT_DIR};
use stream_benchmark_report::report::run_all;

/// Benchmark, save all charts, and build a slide deck of the high-profile methods.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Input video file or RTSP URL
    input: String,

    /// Maximum stream count
    #[arg(allow_negative_numbers = true)]
    streams: i64,

    /// Benchmark executable to run
    #[arg(long, default_value = DEFAULT_EXE)]
    exe: PathBuf,

    /// Directory for the results table, images and deck
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Kill a benchmark run after this many seconds and count it as empty
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config = ReportConfig::new(args.exe, args.output_dir, args.timeout_secs.map(Duration::from_secs));
    let outcome = run_all(&args.input, args.streams, &config)
        .with_context(|| format!("benchmark report for '{}' failed", args.input))?;

    match outcome.deck {
        Some((path, summary)) => println!(
            "\nPowerPoint file created: {} ({} slides)",
            path.display(),
            summary.slides
        ),
        None => println!(
            "\nNo high profile methods found; only {} was written.",
            outcome.results_file.display()
        ),
    }

    Ok(())
}
