use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

/// Which of the child's streams are kept off the terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Suppress {
    #[default]
    Both,
    StdoutOnly,
    StderrOnly,
}

impl Suppress {
    pub fn stdout(self) -> bool {
        matches!(self, Suppress::Both | Suppress::StdoutOnly)
    }

    pub fn stderr(self) -> bool {
        matches!(self, Suppress::Both | Suppress::StderrOnly)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogMode {
    #[default]
    Truncate,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub path: PathBuf,
    pub mode: LogMode,
}

/// One invocation of the runner.
#[derive(Debug)]
pub struct RunRequest {
    /// Program followed by its arguments, passed through unmodified (not necessarily UTF-8).
    pub command: Vec<OsString>,
    pub suppress: Suppress,
    pub log: Option<LogTarget>,
    pub timeout: Option<Duration>,
    /// Any message received here stops the child; the run ends as `Interrupted`.
    pub abort_rx: Option<mpsc::Receiver<String>>,
}

impl RunRequest {
    pub fn new(command: Vec<OsString>) -> Self {
        Self {
            command,
            suppress: Suppress::default(),
            log: None,
            timeout: None,
            abort_rx: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: OsString,
    pub args: Vec<OsString>,
    pub inherit_stdin: bool,
}

/// How the child's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    /// Killed by the given signal number (unix only).
    Signaled(i32),
    TimedOut,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct RunnerResult {
    pub run_id: String,
    pub termination: Termination,
    pub duration_ms: u64,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
    pub logged_bytes: u64,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

impl RunnerResult {
    pub fn exit_code(&self) -> i32 {
        super::exit::child_exit_code(self.termination)
    }

    pub fn success(&self) -> bool {
        self.termination == Termination::Exited(0)
    }
}
