use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use crate::error::RunnerError;

use super::traits::{RunnerPlugin, RunnerSession};
use super::types::{RunnerStartArgs, Termination};

/// Runs the command as a local child process with piped stdout and stderr.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RunnerPlugin for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(
        &self,
        args: &RunnerStartArgs,
    ) -> Result<Box<dyn RunnerSession>, RunnerError> {
        let stdin = if args.inherit_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let child = Command::new(&args.cmd)
            .args(&args.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: args.cmd.to_string_lossy().into_owned(),
                source,
            })?;

        tracing::debug!(pid = ?child.id(), program = ?args.cmd, "spawned");
        Ok(Box::new(ProcessSession { child }))
    }
}

struct ProcessSession {
    child: Child,
}

#[async_trait]
impl RunnerSession for ProcessSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn kill(&mut self) -> anyhow::Result<()> {
        self.child.start_kill()?;
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<Termination> {
        let status = self.child.wait().await?;
        Ok(termination_from_status(status))
    }
}

fn termination_from_status(status: ExitStatus) -> Termination {
    if let Some(code) = status.code() {
        return Termination::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signo) = status.signal() {
            return Termination::Signaled(signo);
        }
    }
    Termination::Exited(-1)
}
