use std::io::Read;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::benchmark_utils::ResultRecord;
use crate::error::{ReportError, Result};
use crate::parser::parse_output;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long output is still collected after a timed-out run was killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Nonzero exit, or killed by a signal (`code` is then `None`).
    Failed { code: Option<i32> },
    TimedOut,
}

/// Everything one benchmark run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub streams: u32,
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl RunOutput {
    /// Parsed rows of a successful run. Failed and timed-out runs have none.
    pub fn records(&self) -> Vec<ResultRecord> {
        match self.status {
            RunStatus::Success => parse_output(&self.stdout, self.streams),
            RunStatus::Failed { .. } | RunStatus::TimedOut => Vec::new(),
        }
    }
}

/// Runs `<exe> <input> <streams>` and waits for it, at most `timeout` if given.
///
/// Only a failure to start the process is an error. A nonzero exit or a
/// timeout is reported through [`RunStatus`] and logged.
///
/// On unix the benchmark gets its own process group, and a timeout kills the
/// whole group so forked workers holding the output pipes go down with it.
pub fn run_benchmark(
    exe: &Path,
    input: &str,
    streams: u32,
    timeout: Option<Duration>,
) -> Result<RunOutput> {
    let started = Instant::now();
    let mut command = Command::new(exe);
    command
        .arg(input)
        .arg(streams.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    command.process_group(0);
    let mut child = command.spawn().map_err(|source| ReportError::Spawn {
            exe: exe.to_path_buf(),
            source,
        })?;

    // Both pipes are drained concurrently so a chatty child cannot block on a full pipe.
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let exit = wait_with_timeout(&mut child, timeout).map_err(|source| ReportError::Spawn {
        exe: exe.to_path_buf(),
        source,
    })?;

    // A worker that escaped the kill may keep a pipe open; stop waiting for it.
    let grace = exit.is_none().then_some(DRAIN_GRACE);
    let stdout = collect(stdout_reader, grace);
    let stderr = collect(stderr_reader, grace);
    let elapsed = started.elapsed();

    let status = match exit {
        None => {
            warn!(streams, ?elapsed, "benchmark timed out and was killed");
            RunStatus::TimedOut
        }
        Some(exit) if exit.success() => RunStatus::Success,
        Some(exit) => {
            warn!(
                streams,
                code = ?exit.code(),
                stderr = %stderr.trim(),
                "error running benchmark"
            );
            RunStatus::Failed { code: exit.code() }
        }
    };
    debug!(streams, ?elapsed, ?status, "benchmark run finished");

    Ok(RunOutput {
        streams,
        status,
        stdout,
        stderr,
        elapsed,
    })
}

/// Returns `None` if the child had to be killed.
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            kill_tree(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // The group id is the child's pid, see `process_group(0)` at spawn.
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: killpg takes plain integers and touches no memory of ours.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "killpg failed, killing the child only");
        // The child may have exited between the poll and the kill.
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    // The child may have exited between the poll and the kill.
    let _ = child.kill();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                debug!(error = %e, read = buf.len(), "output pipe read failed, keeping what arrived");
            }
            // The receiver is gone if the run stopped waiting for this pipe.
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
        rx
    })
}

/// Waits for a drained pipe, at most `grace` if given. Gives up with an empty
/// string when the reader is still blocked after that.
fn collect(reader: Option<Receiver<String>>, grace: Option<Duration>) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    match grace {
        None => reader.recv().unwrap_or_default(),
        Some(grace) => reader.recv_timeout(grace).unwrap_or_else(|_| {
            debug!(?grace, "output pipe still open after kill, dropping its output");
            String::new()
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake_bench.sh");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn passes_input_and_streams_as_arguments() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = script(
            tmp.path(),
            r#"echo "Method | Time/Frame | FPS | CPU | Mem | MVs | Frames | HP"
echo "$1 | 1.5ms | 666 | 5% | 10 | 1 | $2 | ✅""#,
        );

        let run = run_benchmark(&exe, "input.mp4", 7, None).unwrap();
        assert_eq!(run.status, RunStatus::Success);

        let records = run.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "input.mp4");
        assert_eq!(records[0].frames, 7);
        assert_eq!(records[0].streams, 7);
    }

    #[test]
    fn nonzero_exit_yields_no_records() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = script(
            tmp.path(),
            r#"echo "Method | Time/Frame | FPS | CPU | Mem | MVs | Frames | HP"
echo "A | 1.5ms | 666 | 5% | 10 | 1 | 2 | ✅"
echo "decoder crashed" >&2
exit 3"#,
        );

        let run = run_benchmark(&exe, "in", 1, None).unwrap();
        assert_eq!(run.status, RunStatus::Failed { code: Some(3) });
        assert!(run.stderr.contains("decoder crashed"));
        assert!(run.records().is_empty());
    }

    #[test]
    fn timeout_kills_the_child() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = script(tmp.path(), "exec sleep 30");

        let run = run_benchmark(&exe, "in", 1, Some(Duration::from_millis(200))).unwrap();
        assert_eq!(run.status, RunStatus::TimedOut);
        assert!(run.elapsed < Duration::from_secs(10));
        assert!(run.records().is_empty());
    }

    #[test]
    fn timeout_also_stops_forked_workers() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("worker_survived");
        // The worker inherits stderr, so the pipe stays open while it lives.
        let exe = script(
            tmp.path(),
            &format!(
                "(sleep 3; touch {}) >/dev/null &\nwait",
                marker.display()
            ),
        );

        let timeout = Duration::from_millis(300);
        let run = run_benchmark(&exe, "in", 1, Some(timeout)).unwrap();
        assert_eq!(run.status, RunStatus::TimedOut);
        assert!(
            run.elapsed < timeout + Duration::from_secs(2),
            "run took {:?}",
            run.elapsed
        );

        thread::sleep(Duration::from_secs(4));
        assert!(!marker.exists(), "worker outlived the timeout");
    }

    #[test]
    fn collect_gives_up_on_a_pipe_that_never_closes() {
        let (_tx, rx) = mpsc::channel::<String>();
        let started = Instant::now();
        assert_eq!(collect(Some(rx), Some(Duration::from_millis(50))), "");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn collect_returns_drained_output() {
        let rx = drain(Some(&b"Method | Time/Frame"[..]));
        assert_eq!(collect(rx, None), "Method | Time/Frame");
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run_benchmark(&tmp.path().join("nope"), "in", 1, None).unwrap_err();
        assert!(matches!(err, ReportError::Spawn { .. }));
    }
}
