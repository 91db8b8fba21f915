use rustc_hash::FxHashSet;

use crate::benchmark_utils::{Metric, ResultRecord};

/// Legacy methods the benchmark still prints but that are left out of every report.
pub const EXCLUDED_METHODS: [&str; 2] = ["LIVE555 Parser", "Custom H.264 Parser"];

/// Best method at one stream count.
#[derive(Debug, Clone, PartialEq)]
pub struct FastestRow {
    pub streams: u32,
    pub method: String,
    pub time_per_frame: f64,
    pub fps: f64,
    pub cpu: f64,
}

/// One line of a scaling chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub method: String,
    /// `(streams, value)` with ascending streams.
    pub points: Vec<(u32, f64)>,
}

/// One cluster of a grouped bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub streams: u32,
    pub bars: Vec<(String, f64)>,
}

/// Joins the runs in plan order and drops the excluded methods.
pub fn aggregate_runs(runs: Vec<Vec<ResultRecord>>) -> Vec<ResultRecord> {
    runs.into_iter()
        .flatten()
        .filter(|r| !EXCLUDED_METHODS.contains(&r.method.as_str()))
        .collect()
}

pub fn high_profile_view(results: &[ResultRecord]) -> Vec<ResultRecord> {
    results.iter().filter(|r| r.is_high_profile()).cloned().collect()
}

/// Distinct stream counts, ascending.
pub fn stream_order(results: &[ResultRecord]) -> Vec<u32> {
    let mut streams: Vec<u32> = results.iter().map(|r| r.streams).collect();
    streams.sort_unstable();
    streams.dedup();
    streams
}

/// Distinct methods in order of first appearance.
pub fn method_order(results: &[ResultRecord]) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut methods = Vec::new();
    for result in results {
        if seen.insert(result.method.as_str()) {
            methods.push(result.method.clone());
        }
    }
    methods
}

/// Per stream count, the record with the lowest time per frame.
/// The first one wins a tie, and NaN never wins.
pub fn fastest_per_stream(results: &[ResultRecord]) -> Vec<FastestRow> {
    stream_order(results)
        .into_iter()
        .filter_map(|streams| {
            let mut best: Option<&ResultRecord> = None;
            for candidate in results.iter().filter(|r| r.streams == streams) {
                if candidate.time_per_frame.is_nan() {
                    continue;
                }
                match best {
                    Some(b) if b.time_per_frame <= candidate.time_per_frame => {}
                    _ => best = Some(candidate),
                }
            }
            best.map(|r| FastestRow {
                streams,
                method: r.method.clone(),
                time_per_frame: r.time_per_frame,
                fps: r.fps,
                cpu: r.cpu,
            })
        })
        .collect()
}

/// All records measured at `streams`, in collection order.
pub fn records_at(results: &[ResultRecord], streams: u32) -> Vec<&ResultRecord> {
    results.iter().filter(|r| r.streams == streams).collect()
}

/// Mean of `metric` for every method present at `streams`, in method order.
pub fn method_bars(results: &[ResultRecord], streams: u32, metric: Metric) -> Vec<(String, f64)> {
    method_order(results)
        .into_iter()
        .filter_map(|method| {
            mean(
                results
                    .iter()
                    .filter(|r| r.streams == streams && r.method == method)
                    .map(|r| metric.value(r)),
            )
            .map(|value| (method, value))
        })
        .collect()
}

/// One series per method; repeated `(method, streams)` rows are averaged.
pub fn scaling_series(results: &[ResultRecord], metric: Metric) -> Vec<Series> {
    let streams_order = stream_order(results);
    method_order(results)
        .into_iter()
        .map(|method| {
            let points = streams_order
                .iter()
                .filter_map(|&streams| {
                    mean(
                        results
                            .iter()
                            .filter(|r| r.streams == streams && r.method == method)
                            .map(|r| metric.value(r)),
                    )
                    .map(|value| (streams, value))
                })
                .collect();
            Series { method, points }
        })
        .collect()
}

pub fn grouped_bars(results: &[ResultRecord], metric: Metric) -> Vec<BarGroup> {
    stream_order(results)
        .into_iter()
        .map(|streams| BarGroup {
            streams,
            bars: method_bars(results, streams, metric),
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
