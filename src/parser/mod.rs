//! Reader for the table the benchmark executable prints.
//!
//! The format is informal, so the rules are fixed here:
//!
//! * the table starts after the first line containing both `Method` and
//!   `Time/Frame`;
//! * blank lines and lines starting with `—` or `---` are dividers;
//! * every other line is split on `|` into trimmed fields, and needs at least
//!   [`MIN_FIELDS`] of them;
//! * a line whose numeric fields do not parse is dropped, never reported.
//!
//! There is no end-of-table marker: once the header has been seen, any later
//! line with enough well-formed fields is taken as a row.

use crate::benchmark_utils::ResultRecord;

pub const MIN_FIELDS: usize = 8;

const HEADER_MARKERS: [&str; 2] = ["Method", "Time/Frame"];
const DIVIDER_PREFIXES: [&str; 2] = ["—", "---"];

/// Parses the stdout of one run made with `streams` streams.
pub fn parse_output(output: &str, streams: u32) -> Vec<ResultRecord> {
    let mut in_table = false;
    let mut results = Vec::new();

    for line in output.lines() {
        let line = line.trim();

        if HEADER_MARKERS.iter().all(|marker| line.contains(marker)) {
            in_table = true;
            continue;
        }
        if !in_table || is_divider(line) {
            continue;
        }
        if let Some(record) = parse_row(line, streams) {
            results.push(record);
        }
    }

    results
}

fn is_divider(line: &str) -> bool {
    line.is_empty() || DIVIDER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

fn parse_row(line: &str, streams: u32) -> Option<ResultRecord> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    Some(ResultRecord {
        method: fields[0].to_string(),
        streams,
        time_per_frame: fields[1].replace("ms", "").trim().parse().ok()?,
        fps: fields[2].parse().ok()?,
        cpu: fields[3].replace('%', "").trim().parse().ok()?,
        memory: fields[4].parse().ok()?,
        mvs: fields[5].parse().ok()?,
        frames: fields[6].parse().ok()?,
        high_profile: fields[7].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Method | Time/Frame | FPS | CPU | Mem | MVs | Frames | HighProfile";

    #[test]
    fn parses_a_single_row() {
        let output = format!("{HEADER}\nX264 | 12.5ms | 80.0 | 45.0% | 1024.0 | 5 | 100 | ✅\n");
        let records = parse_output(&output, 3);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.method, "X264");
        assert_eq!(r.streams, 3);
        assert_eq!(r.time_per_frame, 12.5);
        assert_eq!(r.fps, 80.0);
        assert_eq!(r.cpu, 45.0);
        assert_eq!(r.memory, 1024.0);
        assert_eq!(r.mvs, 5);
        assert_eq!(r.frames, 100);
        assert_eq!(r.high_profile, "✅");
        assert!(r.is_high_profile());
    }

    #[test]
    fn ignores_everything_before_the_header() {
        let output = format!(
            "warming up | 1 | 2 | 3 | 4 | 5 | 6 | 7\n\
             {HEADER}\n\
             A | 1.0 ms | 1000 | 10 % | 5 | 1 | 2 | ✅\n"
        );
        let records = parse_output(&output, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "A");
        assert_eq!(records[0].time_per_frame, 1.0);
        assert_eq!(records[0].cpu, 10.0);
    }

    #[test]
    fn no_header_means_no_records() {
        let output = "X264 | 12.5ms | 80.0 | 45.0% | 1024.0 | 5 | 100 | ✅\n";
        assert!(parse_output(output, 1).is_empty());
    }

    #[test]
    fn skips_dividers_and_blank_lines() {
        let output = format!(
            "{HEADER}\n\
             ————————————————————————\n\
             -----------------------\n\
             \n\
             A | 2.0ms | 500 | 1% | 0 | 0 | 10 | ✅\n\
             \n\
             B | 3.0ms | 333 | 2% | -8.5 | 7 | 10 | ❌\n"
        );
        let records = parse_output(&output, 5);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].method, "B");
        assert_eq!(records[1].memory, -8.5);
        assert!(!records[1].is_high_profile());
    }

    #[test]
    fn malformed_rows_are_dropped_without_stopping() {
        let output = format!(
            "{HEADER}\n\
             Short | 1.0ms | 2\n\
             BadFps | 1.0ms | fast | 1% | 0 | 0 | 0 | ✅\n\
             BadMvs | 1.0ms | 2.0 | 1% | 0 | -3 | 0 | ✅\n\
             BadFrames | 1.0ms | 2.0 | 1% | 0 | 3 | 1.5 | ✅\n\
             Good | 1.0ms | 2.0 | 1% | 0 | 3 | 4 | ✅\n"
        );
        let records = parse_output(&output, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "Good");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let output = format!("{HEADER}\nA | 1ms | 2 | 3% | 4 | 5 | 6 | ✅ | extra | more\n");
        let records = parse_output(&output, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].high_profile, "✅");
    }

    #[test]
    fn trailing_text_with_enough_fields_is_read_as_a_row() {
        let output = format!(
            "{HEADER}\n\
             A | 1ms | 2 | 3% | 4 | 5 | 6 | ✅\n\
             Summary: done\n\
             totals | 0 | 0 | 0 | 0 | 0 | 0 | -\n"
        );
        let records = parse_output(&output, 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].method, "totals");
    }

    #[test]
    fn indented_lines_are_trimmed() {
        let output = format!("   {HEADER}\n   A | 1ms | 2 | 3% | 4 | 5 | 6 | ✅   \r\n");
        let records = parse_output(&output, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].streams, 10);
    }
}
