mod abort;
pub mod exit;
mod io_pump;
mod process;
mod run;
mod runtime;
mod tee;
mod traits;
pub mod types;

pub use process::ProcessRunner;
pub use run::{run_command, run_with_plugin};
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{
    LogMode, LogTarget, RunRequest, RunnerResult, RunnerStartArgs, Suppress, Termination,
};
