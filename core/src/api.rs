//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `shush_core::api` instead of reaching into internal modules.

pub use crate::config::{load, load_from_path, AppConfig, LoggingConfig, RunnerConfig};
pub use crate::error::{CliError, RunnerError};
pub use crate::runner::exit::{exit_code_for_result, EXIT_INTERRUPTED, EXIT_TIMED_OUT};
pub use crate::runner::{
    run_command, run_with_plugin, LogMode, LogTarget, ProcessRunner, RunRequest, RunnerPlugin,
    RunnerResult, RunnerSession, Suppress, Termination,
};
