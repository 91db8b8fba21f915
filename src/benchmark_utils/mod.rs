use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Marker the benchmark prints in its last column for high-profile methods.
pub const HIGH_PROFILE_MARKER: &str = "✅";

/// Column header of the flat results table.
pub const RESULTS_HEADER: [&str; 9] = [
    "method",
    "streams",
    "time_per_frame",
    "fps",
    "cpu",
    "memory",
    "mvs",
    "frames",
    "high_profile",
];

/// One row of benchmark output: a method measured at one stream count.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub method: String,
    pub streams: u32,
    pub time_per_frame: f64, // ms
    pub fps: f64,
    pub cpu: f64,    // percent
    pub memory: f64, // kB, may be a delta and therefore negative
    pub mvs: u64,
    pub frames: u64,
    pub high_profile: String,
}

impl ResultRecord {
    pub fn is_high_profile(&self) -> bool {
        self.high_profile == HIGH_PROFILE_MARKER
    }
}

/// The four metrics that get charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Fps,
    TimePerFrame,
    Cpu,
    Memory,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Fps, Metric::TimePerFrame, Metric::Cpu, Metric::Memory];

    pub fn value(self, record: &ResultRecord) -> f64 {
        match self {
            Metric::Fps => record.fps,
            Metric::TimePerFrame => record.time_per_frame,
            Metric::Cpu => record.cpu,
            Metric::Memory => record.memory,
        }
    }

    /// Key used in image file names, e.g. `scaling_timeperframe.png`.
    pub fn file_key(self) -> &'static str {
        match self {
            Metric::Fps => "fps",
            Metric::TimePerFrame => "timeperframe",
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Metric::Fps => "Frames per Second (Higher = Better)",
            Metric::TimePerFrame => "Time per Frame (ms, Lower = Better)",
            Metric::Cpu => "CPU Usage (%)",
            Metric::Memory => "Memory (kB)",
        }
    }
}

/// Writes the flat results table, header first, one row per record.
pub fn write_benchmark_results<P: AsRef<Path>>(results: &[ResultRecord], file_path: P) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(file_path)?;

    // Written by hand so that an empty run still produces a header.
    writer.write_record(RESULTS_HEADER)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush().map_err(csv::Error::from)?;

    Ok(())
}

/// Reads a table previously written by [`write_benchmark_results`].
pub fn read_benchmark_results<P: AsRef<Path>>(file_path: P) -> Result<Vec<ResultRecord>> {
    let mut reader = csv::Reader::from_path(file_path)?;
    let mut results = Vec::new();
    for record in reader.deserialize() {
        results.push(record?);
    }
    Ok(results)
}

pub fn print_benchmark_results(results: &[ResultRecord]) {
    let mut table = Table::new();
    table.add_row(row![
        "Method",
        "Streams",
        "Time/Frame (ms)",
        "FPS",
        "CPU (%)",
        "Mem (kB)",
        "MVs",
        "Frames",
        "High Profile"
    ]);

    for result in results {
        table.add_row(row![
            &result.method,
            result.streams,
            format!("{:.2}", result.time_per_frame),
            format!("{:.2}", result.fps),
            format!("{:.1}", result.cpu),
            format!("{:.1}", result.memory),
            result.mvs,
            result.frames,
            &result.high_profile,
        ]);
    }

    println!();
    table.printstd();
    println!();
}

#[cfg(test)]
pub(crate) fn record(method: &str, streams: u32, time_per_frame: f64) -> ResultRecord {
    ResultRecord {
        method: method.to_string(),
        streams,
        time_per_frame,
        fps: 1000.0 / time_per_frame,
        cpu: 40.0,
        memory: 512.0,
        mvs: 10,
        frames: 100,
        high_profile: HIGH_PROFILE_MARKER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_profile_requires_the_exact_marker() {
        let mut r = record("X264", 1, 10.0);
        assert!(r.is_high_profile());
        r.high_profile = "❌".to_string();
        assert!(!r.is_high_profile());
        r.high_profile = "yes".to_string();
        assert!(!r.is_high_profile());
    }

    #[test]
    fn metric_accessors_pick_the_right_field() {
        let r = ResultRecord {
            method: "m".into(),
            streams: 3,
            time_per_frame: 1.0,
            fps: 2.0,
            cpu: 3.0,
            memory: -4.0,
            mvs: 0,
            frames: 0,
            high_profile: String::new(),
        };
        let values: Vec<f64> = Metric::ALL.iter().map(|m| m.value(&r)).collect();
        assert_eq!(values, vec![2.0, 1.0, 3.0, -4.0]);
    }

    #[test]
    fn results_table_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("benchmark_results.csv");

        let mut other = record("FFmpeg, libavcodec", 5, 8.25);
        other.memory = -12.5;
        other.high_profile = "❌".to_string();
        let results = vec![record("X264", 1, 12.5), other];

        write_benchmark_results(&results, &path).unwrap();
        let read = read_benchmark_results(&path).unwrap();
        assert_eq!(read, results);
    }

    #[test]
    fn empty_table_still_has_a_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.csv");

        write_benchmark_results(&[], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.trim_end(),
            "method,streams,time_per_frame,fps,cpu,memory,mvs,frames,high_profile"
        );
        assert!(read_benchmark_results(&path).unwrap().is_empty());
    }
}
