use std::path::PathBuf;
use thiserror::Error;

/// Errors that escape the recovered paths of the report pipeline.
///
/// Nonzero benchmark exits, timeouts and malformed table lines are not errors:
/// they are logged and folded into an empty run. What remains here are the
/// failures that a caller has to decide about.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("results table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to launch benchmark '{}': {source}", exe.display())]
    Spawn {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render '{}': {message}", path.display())]
    Render { path: PathBuf, message: String },

    #[error("failed to write slide deck: {0}")]
    Deck(#[from] zip::result::ZipError),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = ReportError::io(
            "plots/benchmark_results.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("plots/benchmark_results.csv"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn spawn_error_names_the_executable() {
        let err = ReportError::Spawn {
            exe: PathBuf::from("./benchmark_all_9"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("./benchmark_all_9"));
    }
}
