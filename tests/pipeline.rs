#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::fs::File;
use std::time::{Duration, Instant};

use stream_benchmark_report::benchmark_utils::read_benchmark_results;
use stream_benchmark_report::config::ReportConfig;
use stream_benchmark_report::report::{run_all, DECK_FILE, RESULTS_FILE};

const FAKE_BENCHMARK: &str = r#"#!/bin/sh
streams="$2"
if [ "$streams" = "3" ]; then
    echo "capture device busy" >&2
    exit 2
fi
if [ "$streams" = "10" ]; then
    sleep 30 >/dev/null &
    wait
fi
echo "Benchmarking $1 with $streams streams"
echo "Method | Time/Frame | FPS | CPU | Mem | MVs | Frames | HighProfile"
echo "———————————————————————————————————————"
echo "FFmpeg Extractor | $((streams * 2)).5ms | 80.0 | 45.0% | 1024.0 | 5 | 100 | ✅"
echo "Slice Parser | $((streams * 3)).0ms | 50.0 | 30.0% | -16.0 | 9 | 100 | ✅"
echo "LIVE555 Parser | 1.0ms | 999.0 | 1.0% | 1.0 | 1 | 100 | ✅"
echo "Custom H.264 Parser | 1.0ms | 999.0 | 1.0% | 1.0 | 1 | 100 | ✅"
echo "Legacy Scanner | 4.0ms | 250.0 | 10.0% | 8.0 | 2 | 100 | ❌"
echo "truncated | 4.0ms"
echo ""
"#;

const NOTHING_HIGH_PROFILE: &str = r#"#!/bin/sh
echo "Method | Time/Frame | FPS | CPU | Mem | MVs | Frames | HighProfile"
echo "Legacy Scanner | 4.0ms | 250.0 | 10.0% | 8.0 | 2 | 100 | ❌"
"#;

fn install_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("benchmark_all_9");
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn full_pipeline_writes_table_and_deck() {
    let tmp = tempfile::tempdir().unwrap();
    let exe = install_script(tmp.path(), FAKE_BENCHMARK);
    let out = tmp.path().join("plots");
    let config = ReportConfig::new(exe, &out, Some(Duration::from_secs(2)));

    // Plan is 1, 3, 5, 10: run 3 fails and run 10 times out with a forked
    // worker still holding stderr.
    let started = Instant::now();
    let outcome = run_all("rtsp://camera/stream", 12, &config).unwrap();
    assert!(started.elapsed() < Duration::from_secs(20), "took {:?}", started.elapsed());

    let methods: Vec<(&str, u32)> = outcome
        .results
        .iter()
        .map(|r| (r.method.as_str(), r.streams))
        .collect();
    assert_eq!(
        methods,
        vec![
            ("FFmpeg Extractor", 1),
            ("Slice Parser", 1),
            ("Legacy Scanner", 1),
            ("FFmpeg Extractor", 5),
            ("Slice Parser", 5),
            ("Legacy Scanner", 5),
        ]
    );

    let saved = read_benchmark_results(out.join(RESULTS_FILE)).unwrap();
    assert_eq!(saved, outcome.results);
    assert_eq!(saved[4].time_per_frame, 15.0);
    assert_eq!(saved[4].memory, -16.0);

    let (deck_path, summary) = outcome.deck.expect("high profile methods present");
    assert_eq!(deck_path, out.join(DECK_FILE));
    assert!(deck_path.is_file());
    // fastest + 4 scaling + 4 grouped + section + 2 detail tables + 2 x 4 bar charts
    assert_eq!(summary.slides, 20);
    // blank.png needs no font, so at least that picture is always embedded.
    assert!(summary.images >= 1);
    assert!(summary.images <= summary.slides);

    let archive = zip::ZipArchive::new(File::open(&deck_path).unwrap()).unwrap();
    assert!(archive.file_names().any(|name| name.starts_with("ppt/media/")));
}

#[test]
fn no_high_profile_methods_means_no_charts_and_no_deck() {
    let tmp = tempfile::tempdir().unwrap();
    let exe = install_script(tmp.path(), NOTHING_HIGH_PROFILE);
    let out = tmp.path().join("plots");
    let config = ReportConfig::new(exe, &out, None);

    let outcome = run_all("input.h264", 3, &config).unwrap();
    assert!(outcome.deck.is_none());
    assert_eq!(outcome.results.len(), 2);

    let files: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec![RESULTS_FILE.to_string()]);
}

#[test]
fn missing_executable_still_writes_an_empty_table() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("plots");
    let config = ReportConfig::new(tmp.path().join("does_not_exist"), &out, None);

    let outcome = run_all("input.h264", 5, &config).unwrap();
    assert!(outcome.results.is_empty());
    assert!(outcome.deck.is_none());
    assert!(read_benchmark_results(out.join(RESULTS_FILE)).unwrap().is_empty());
}
