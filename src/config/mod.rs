use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReportError, Result};

/// Installs the stderr log subscriber used by the binaries.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub const DEFAULT_EXE: &str = "./benchmark_all_9";
pub const DEFAULT_OUTPUT_DIR: &str = "plots";

/// Where the benchmark lives, where the report goes, and how long a run may take.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub exe: PathBuf,
    pub output_dir: PathBuf,
    /// `None` waits for every run to finish, however long it takes.
    pub timeout: Option<Duration>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            exe: PathBuf::from(DEFAULT_EXE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout: None,
        }
    }
}

impl ReportConfig {
    pub fn new(
        exe: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        ReportConfig {
            exe: exe.into(),
            output_dir: output_dir.into(),
            timeout,
        }
    }

    /// Creates the output directory. Called once, before anything is written.
    pub fn prepare_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| ReportError::io(&self.output_dir, e))
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_match_the_cli_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.exe, PathBuf::from("./benchmark_all_9"));
        assert_eq!(config.output_dir, PathBuf::from("plots"));
        assert!(config.timeout.is_none());
    }

    #[test]
    fn prepare_output_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("a").join("b");
        let config = ReportConfig::new(Path::new("bench"), &out, None);
        config.prepare_output_dir().unwrap();
        assert!(out.is_dir());
        assert_eq!(config.output_path("x.png"), out.join("x.png"));
    }
}
