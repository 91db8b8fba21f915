/// Stream counts that are always tried when the maximum allows them.
const BASE_STREAMS: [u32; 3] = [1, 3, 5];
const STEP_START: u32 = 10;
const STEP: usize = 5;

/// Returns the stream counts to benchmark for a given maximum.
///
/// The plan is `1, 3, 5` (those not above `max_streams`) followed by every
/// multiple of five from 10 up to `max_streams`. The order is the x-axis order
/// of every chart, so it must stay ascending and reproducible.
pub fn generate_stream_runs(max_streams: i64) -> Vec<u32> {
    let mut runs: Vec<u32> = BASE_STREAMS
        .iter()
        .copied()
        .filter(|&s| i64::from(s) <= max_streams)
        .collect();

    if max_streams > 5 {
        let max = u32::try_from(max_streams).unwrap_or(u32::MAX);
        runs.extend((STEP_START..=max).step_by(STEP));
    }

    runs
}
