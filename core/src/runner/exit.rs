//! Exit code normalization.

use super::types::{RunnerResult, Termination};

/// Same convention as coreutils `timeout`.
pub const EXIT_TIMED_OUT: i32 = 124;
/// 128 + SIGINT.
pub const EXIT_INTERRUPTED: i32 = 130;
pub const SIGNAL_EXIT_BASE: i32 = 128;

pub fn child_exit_code(termination: Termination) -> i32 {
    match termination {
        Termination::Exited(code) => code,
        Termination::Signaled(signo) => SIGNAL_EXIT_BASE + signo,
        Termination::TimedOut => EXIT_TIMED_OUT,
        Termination::Interrupted => EXIT_INTERRUPTED,
    }
}

/// The code shush itself exits with once the child has run.
///
/// Without `propagate` the child's outcome is swallowed along with its output.
pub fn exit_code_for_result(result: &RunnerResult, propagate: bool) -> i32 {
    if propagate {
        result.exit_code()
    } else {
        0
    }
}
