use tracing::Instrument;

use crate::config::RunnerConfig;
use crate::error::RunnerError;

use super::process::ProcessRunner;
use super::runtime;
use super::tee;
use super::traits::RunnerPlugin;
use super::types::{RunRequest, RunnerResult, RunnerStartArgs};

/// Run `request` as a local child process.
pub async fn run_command(
    request: RunRequest,
    cfg: &RunnerConfig,
) -> Result<RunnerResult, RunnerError> {
    run_with_plugin(&ProcessRunner::new(), request, cfg).await
}

pub async fn run_with_plugin(
    plugin: &dyn RunnerPlugin,
    request: RunRequest,
    cfg: &RunnerConfig,
) -> Result<RunnerResult, RunnerError> {
    let RunRequest {
        command,
        suppress,
        log,
        timeout,
        abort_rx,
    } = request;

    let (cmd, args) = command
        .split_first()
        .ok_or_else(|| RunnerError::Config("no command given to run".into()))?;

    let run_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("run", run_id = %run_id, program = %cmd.to_string_lossy());

    async {
        // Opened before the spawn so an unusable log path never runs the command.
        let mut log = match log.as_ref() {
            Some(target) => Some(tee::open_log(target).await?),
            None => None,
        };

        let start_args = RunnerStartArgs {
            cmd: cmd.clone(),
            args: args.to_vec(),
            inherit_stdin: cfg.inherit_stdin,
        };
        let session = plugin.start_session(&start_args).await?;
        if let Some(sink) = log.as_mut() {
            sink.begin().await?;
        }
        tracing::debug!(runner = plugin.name(), args = ?start_args.args, "session started");

        runtime::run_session_runtime(runtime::RunSessionRuntimeInput {
            session,
            cfg,
            suppress,
            log,
            timeout,
            run_id: &run_id,
            abort_rx,
        })
        .await
    }
    .instrument(span)
    .await
}
