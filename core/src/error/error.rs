use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Runner(#[from] RunnerError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(String),
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("cannot open log file {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write log file {}: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("session error: {0}")]
    Session(#[from] anyhow::Error),
}

impl RunnerError {
    /// True when the program itself could not be found on `PATH` (or at the given path).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RunnerError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_not_found_is_distinguished() {
        let err = RunnerError::Spawn {
            program: "nope".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "failed to run 'nope': missing");

        let err = RunnerError::Spawn {
            program: "/etc/passwd".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn log_errors_name_the_path() {
        let err = RunnerError::LogOpen {
            path: PathBuf::from("/no/such/dir/x.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/no/such/dir/x.log"));
    }
}
