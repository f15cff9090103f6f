use std::time::Duration;

use super::traits::RunnerSession;
use super::types::Termination;

/// Kill the child and give it `grace` to be reaped.
///
/// Returns how the child actually went down, if that could be observed in time.
pub async fn abort_sequence(
    session: &mut Box<dyn RunnerSession>,
    grace: Duration,
    reason: &str,
) -> Option<Termination> {
    tracing::warn!(error.kind = "runner.abort", reason = %reason, "stopping command");

    if let Err(e) = session.kill().await {
        // Usually the child exited on its own between the trigger and the kill.
        tracing::debug!(error.kind = "runner.kill_failed", error.message = %e);
    }

    match tokio::time::timeout(grace, session.wait()).await {
        Ok(Ok(t)) => Some(t),
        Ok(Err(e)) => {
            tracing::warn!(error.kind = "runner.reap_failed", error.message = %e);
            None
        }
        Err(_) => {
            tracing::warn!(
                error.kind = "runner.reap_timeout",
                grace_ms = grace.as_millis() as u64,
                "command did not exit after kill"
            );
            None
        }
    }
}
