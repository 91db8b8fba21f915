use prettytable::{row, Table};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::aggregate::{
    aggregate_runs, fastest_per_stream, grouped_bars, high_profile_view, method_bars, method_order,
    records_at, scaling_series, stream_order, FastestRow,
};
use crate::benchmark_utils::{print_benchmark_results, write_benchmark_results, Metric, ResultRecord};
use crate::charts;
use crate::config::ReportConfig;
use crate::deck::{write_deck, DeckSummary, Slide};
use crate::error::Result;
use crate::runner::run_benchmark;
use crate::stream_plan::generate_stream_runs;

pub const RESULTS_FILE: &str = "benchmark_results.csv";
pub const DECK_FILE: &str = "benchmark_comparison_slides_high_profile.pptx";
pub const FASTEST_TABLE_FILE: &str = "fastest_high_profile_methods.png";
pub const BLANK_FILE: &str = "blank.png";

const FASTEST_HEADERS: [&str; 5] = ["Streams", "Method", "Time/Frame (ms)", "FPS", "CPU (%)"];
const DETAIL_HEADERS: [&str; 7] = [
    "Method",
    "Time/frame (ms)",
    "FPS",
    "CPU (%)",
    "Mem Δ KB",
    "Total MVs",
    "Frames",
];

/// What a report run left behind.
#[derive(Debug)]
pub struct ReportOutcome {
    /// Every record that survived the exclusion filter, high-profile or not.
    pub results: Vec<ResultRecord>,
    pub results_file: PathBuf,
    /// `None` when there was nothing high-profile to report on.
    pub deck: Option<(PathBuf, DeckSummary)>,
}

/// Benchmarks `input` at every planned stream count up to `max_streams`,
/// then writes the results table, the charts and the deck.
pub fn run_all(input: &str, max_streams: i64, config: &ReportConfig) -> Result<ReportOutcome> {
    config.prepare_output_dir()?;

    let plan = generate_stream_runs(max_streams);
    info!(?plan, "stream counts to test");

    let mut runs = Vec::with_capacity(plan.len());
    for &streams in &plan {
        info!(streams, "running benchmark");
        let records = match run_benchmark(&config.exe, input, streams, config.timeout) {
            Ok(run) => run.records(),
            Err(e) => {
                warn!(streams, error = %e, "benchmark could not be run");
                Vec::new()
            }
        };
        if records.is_empty() {
            warn!(streams, "no data returned");
        }
        runs.push(records);
    }

    build_report(aggregate_runs(runs), config)
}

/// Writes the results table and, if any method is high-profile, every chart
/// and the slide deck. The output directory must already exist.
pub fn build_report(results: Vec<ResultRecord>, config: &ReportConfig) -> Result<ReportOutcome> {
    let results_file = config.output_path(RESULTS_FILE);
    write_benchmark_results(&results, &results_file)?;
    info!(path = %results_file.display(), records = results.len(), "saved complete data table");
    print_benchmark_results(&results);

    let view = high_profile_view(&results);
    if view.is_empty() {
        warn!("no high profile methods found in results, skipping charts and slides");
        return Ok(ReportOutcome {
            results,
            results_file,
            deck: None,
        });
    }

    let slides = render_slides(&view, config);
    let deck_file = config.output_path(DECK_FILE);
    let summary = write_deck(&slides, &deck_file)?;
    info!(
        path = %deck_file.display(),
        slides = summary.slides,
        images = summary.images,
        "slide deck created"
    );

    Ok(ReportOutcome {
        results,
        results_file,
        deck: Some((deck_file, summary)),
    })
}

/// Renders every image of the report and returns the slides in deck order.
///
/// A chart that fails to render is logged and keeps its slide. If no file was
/// produced, the deck writer leaves that slide without a picture.
pub fn render_slides(view: &[ResultRecord], config: &ReportConfig) -> Vec<Slide> {
    let streams_order = stream_order(view);
    let methods = method_order(view);
    let mut slides = Vec::new();

    // Fastest method per stream count
    let fastest = fastest_per_stream(view);
    print_fastest(&fastest);
    let rows: Vec<Vec<String>> = fastest
        .iter()
        .map(|f| {
            vec![
                f.streams.to_string(),
                f.method.clone(),
                format!("{:.2}", f.time_per_frame),
                format!("{:.2}", f.fps),
                format!("{:.1}", f.cpu),
            ]
        })
        .collect();
    let path = config.output_path(FASTEST_TABLE_FILE);
    saved(
        charts::render_table("Fastest High Profile Method Per Streams", &FASTEST_HEADERS, &rows, &path),
        &path,
    );
    slides.push(Slide::new(
        "Fastest Methods",
        "Best (lowest time/frame) method at each streams value",
        path,
    ));

    // Scaling curves
    for metric in Metric::ALL {
        let (title, subtitle) = scaling_text(metric);
        let path = config.output_path(&format!("scaling_{}.png", metric.file_key()));
        saved(
            charts::render_line_chart(title, metric.axis_label(), &scaling_series(view, metric), &path),
            &path,
        );
        slides.push(Slide::new(title, subtitle, path));
    }

    // Grouped bars, all stream counts side by side
    for metric in Metric::ALL {
        let (chart_title, title, subtitle) = grouped_text(metric);
        let path = config.output_path(&format!("grouped_barchart_{}.png", metric.file_key()));
        saved(
            charts::render_grouped_bars(
                chart_title,
                metric.axis_label(),
                &grouped_bars(view, metric),
                &methods,
                &path,
            ),
            &path,
        );
        slides.push(Slide::new(title, subtitle, path));
    }

    let path = config.output_path(BLANK_FILE);
    saved(charts::render_blank(&path), &path);
    slides.push(Slide::new("Detailed Tables", "Full Per-Streams Benchmark Results", path));

    for &streams in &streams_order {
        let rows: Vec<Vec<String>> = records_at(view, streams)
            .into_iter()
            .map(|r| {
                vec![
                    r.method.clone(),
                    format!("{:.2}", r.time_per_frame),
                    format!("{:.2}", r.fps),
                    format!("{:.1}", r.cpu),
                    format!("{:.1}", r.memory),
                    r.mvs.to_string(),
                    r.frames.to_string(),
                ]
            })
            .collect();
        let path = config.output_path(&format!("detail_table_{streams}streams.png"));
        saved(
            charts::render_table(&format!("All Methods: Streams={streams}"), &DETAIL_HEADERS, &rows, &path),
            &path,
        );
        slides.push(Slide::new(
            format!("Detailed Table: Streams={streams}"),
            format!("All metrics for high-profile methods, streams={streams}"),
            path,
        ));
    }

    for &streams in &streams_order {
        for metric in Metric::ALL {
            let (chart_title, title, subtitle) = per_stream_text(metric, streams);
            let path = config.output_path(&format!("barchart_{}_{streams}streams.png", metric.file_key()));
            saved(
                charts::render_method_bars(
                    &chart_title,
                    metric.axis_label(),
                    &method_bars(view, streams, metric),
                    &path,
                ),
                &path,
            );
            slides.push(Slide::new(title, subtitle, path));
        }
    }

    slides
}

fn saved(result: Result<()>, path: &std::path::Path) {
    match result {
        Ok(()) => info!(path = %path.display(), "saved image"),
        Err(e) => warn!(error = %e, "image not rendered"),
    }
}

fn print_fastest(fastest: &[FastestRow]) {
    let mut table = Table::new();
    table.add_row(row!["Streams", "Method", "Time/Frame (ms)", "FPS", "CPU (%)"]);
    for f in fastest {
        table.add_row(row![
            f.streams,
            &f.method,
            format!("{:.2}", f.time_per_frame),
            format!("{:.2}", f.fps),
            format!("{:.1}", f.cpu),
        ]);
    }

    println!("\nFastest high profile method per streams:");
    table.printstd();
}

fn scaling_text(metric: Metric) -> (&'static str, &'static str) {
    match metric {
        Metric::Fps => ("Throughput Scaling", "High Profile Methods: FPS vs Streams"),
        Metric::TimePerFrame => ("Latency Scaling", "High Profile Methods: Time per Frame vs Streams"),
        Metric::Cpu => ("CPU Usage Scaling", "High Profile Methods: CPU Usage (%) vs Streams"),
        Metric::Memory => ("Memory Usage Scaling", "High Profile Methods: Memory Usage (kB) vs Streams"),
    }
}

/// Chart caption, slide title and slide subtitle of a grouped bar chart.
fn grouped_text(metric: Metric) -> (&'static str, &'static str, &'static str) {
    match metric {
        Metric::Fps => (
            "Algorithm Throughput (FPS) vs Streams - Grouped Bar",
            "Grouped FPS Comparison (All Streams)",
            "All High Profile Methods: FPS per Streams, Grouped Bar Chart",
        ),
        Metric::TimePerFrame => (
            "Algorithm Latency (ms/frame) vs Streams - Grouped Bar",
            "Grouped Latency Comparison (All Streams)",
            "All High Profile Methods: Latency (ms/frame) per Streams, Grouped Bar Chart",
        ),
        Metric::Cpu => (
            "Algorithm CPU Usage (%) vs Streams - Grouped Bar",
            "Grouped CPU Usage Comparison (All Streams)",
            "All High Profile Methods: CPU Usage per Streams, Grouped Bar Chart",
        ),
        Metric::Memory => (
            "Algorithm Memory Usage (kB) vs Streams - Grouped Bar",
            "Grouped Memory Usage Comparison (All Streams)",
            "All High Profile Methods: Memory Usage per Streams, Grouped Bar Chart",
        ),
    }
}

fn per_stream_text(metric: Metric, streams: u32) -> (String, String, String) {
    let (caption, label, description) = match metric {
        Metric::Fps => ("FPS", "FPS", "Throughput (FPS)"),
        Metric::TimePerFrame => ("Time/Frame", "Latency", "Time per Frame (ms)"),
        Metric::Cpu => ("CPU %", "CPU Usage", "CPU Usage (%)"),
        Metric::Memory => ("Memory", "Memory Usage", "Memory Peak (kB)"),
    };
    (
        format!("Algorithm Comparison: {caption} @ {streams} Streams"),
        format!("Algorithm {label} Comparison ({streams} Streams)"),
        format!("{description} by High Profile Method at {streams} Streams"),
    )
}
