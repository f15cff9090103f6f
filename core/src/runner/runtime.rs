//! Runner runtime: pumps stdout/stderr, tees to the log writer, races child exit against
//! timeout and abort, and assembles the result.
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::util::RingBytes;

use super::abort;
use super::io_pump;
use super::tee::{self, LogSink};
use super::traits::RunnerSession;
use super::types::{RunnerResult, Suppress, Termination};

pub struct RunSessionRuntimeInput<'a> {
    pub session: Box<dyn RunnerSession>,
    pub cfg: &'a RunnerConfig,
    pub suppress: Suppress,
    pub log: Option<LogSink>,
    pub timeout: Option<Duration>,
    pub run_id: &'a str,
    pub abort_rx: Option<mpsc::Receiver<String>>,
}

#[derive(Debug)]
enum AbortReason {
    Timeout(Duration),
    External(String),
}

impl AbortReason {
    fn describe(&self) -> String {
        match self {
            AbortReason::Timeout(d) => format!("timed out after {}s", d.as_secs_f64()),
            AbortReason::External(msg) => msg.clone(),
        }
    }

    fn termination(&self) -> Termination {
        match self {
            AbortReason::Timeout(_) => Termination::TimedOut,
            AbortReason::External(_) => Termination::Interrupted,
        }
    }
}

pub async fn run_session_runtime(
    input: RunSessionRuntimeInput<'_>,
) -> Result<RunnerResult, RunnerError> {
    let RunSessionRuntimeInput {
        mut session,
        cfg,
        suppress,
        log,
        timeout,
        run_id,
        mut abort_rx,
    } = input;

    let stdout = session
        .stdout()
        .ok_or_else(|| RunnerError::Session(anyhow::anyhow!("child stdout not captured")))?;
    let stderr = session
        .stderr()
        .ok_or_else(|| RunnerError::Session(anyhow::anyhow!("child stderr not captured")))?;

    let ring_out = RingBytes::new(cfg.capture_bytes);
    let ring_err = RingBytes::new(cfg.capture_bytes);
    let started_at = Instant::now();

    let (log_tx, log_task) = match log {
        Some(sink) => {
            tracing::debug!(path = %sink.path.display(), "logging command output");
            let (tx, task) = tee::spawn_log_writer(sink, cfg.log_channel_capacity);
            (Some(tx), Some(task))
        }
        None => (None, None),
    };

    let out_task = io_pump::pump_stdout(
        stdout,
        ring_out.clone(),
        log_tx.clone(),
        suppress.stdout(),
        cfg.chunk_size,
    );
    let err_task = io_pump::pump_stderr(
        stderr,
        ring_err.clone(),
        log_tx,
        suppress.stderr(),
        cfg.chunk_size,
    );

    let (exit_status, abort_reason) = {
        let wait_fut = session.wait();
        tokio::pin!(wait_fut);

        let timer = async {
            match timeout {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timer);

        let mut abort_open = abort_rx.is_some();
        let mut status = None;
        let mut reason = None;

        loop {
            tokio::select! {
                res = &mut wait_fut => {
                    status = Some(res);
                    break;
                }

                _ = &mut timer => {
                    if let Some(d) = timeout {
                        reason = Some(AbortReason::Timeout(d));
                    }
                    break;
                }

                msg = async {
                    match abort_rx.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                }, if abort_open => {
                    match msg {
                        Some(msg) => {
                            reason = Some(AbortReason::External(msg));
                            break;
                        }
                        // Nobody can abort us anymore; keep waiting on the child.
                        None => abort_open = false,
                    }
                }
            }
        }
        (status, reason)
    };

    let (termination, drain_limit) = match abort_reason {
        Some(reason) => {
            let observed =
                abort::abort_sequence(&mut session, cfg.abort_grace(), &reason.describe()).await;
            tracing::debug!(?observed, "child stopped");
            (reason.termination(), cfg.abort_grace())
        }
        None => {
            let status = exit_status.ok_or_else(|| {
                RunnerError::Session(anyhow::anyhow!("child wait did not complete"))
            })?;
            (status.map_err(RunnerError::Session)?, cfg.drain_grace())
        }
    };

    let stdout_bytes = join_pump(out_task, drain_limit, "stdout").await?;
    let stderr_bytes = join_pump(err_task, drain_limit, "stderr").await?;
    let logged_bytes = match log_task {
        Some(task) => join_task(task).await?,
        None => 0,
    };

    let duration_ms = started_at.elapsed().as_millis() as u64;
    let stdout_tail = ring_out.to_string_lossy();
    let stderr_tail = ring_err.to_string_lossy();

    if termination == Termination::Exited(0) {
        tracing::debug!(
            run_id,
            duration_ms,
            stdout_bytes,
            stderr_bytes,
            logged_bytes,
            "command finished"
        );
    } else {
        tracing::info!(
            run_id,
            ?termination,
            duration_ms,
            stderr_tail = %stderr_tail.trim_end(),
            "command failed"
        );
    }

    Ok(RunnerResult {
        run_id: run_id.to_string(),
        termination,
        duration_ms,
        stdout_bytes,
        stderr_bytes,
        logged_bytes,
        stdout_tail,
        stderr_tail,
    })
}

// The child is gone by now, but anything it left running in the background may still
// hold the pipes open. Stop reading after `limit` instead of waiting for them.
async fn join_pump(
    mut task: JoinHandle<Result<u64, RunnerError>>,
    limit: Duration,
    label: &'static str,
) -> Result<u64, RunnerError> {
    match tokio::time::timeout(limit, &mut task).await {
        Ok(res) => res.map_err(|e| RunnerError::Session(e.into()))?,
        Err(_) => {
            tracing::info!(
                error.kind = "stream.drain_timeout",
                stream = label,
                limit_ms = limit.as_millis() as u64
            );
            task.abort();
            Ok(0)
        }
    }
}

async fn join_task(task: JoinHandle<Result<u64, RunnerError>>) -> Result<u64, RunnerError> {
    task.await.map_err(|e| RunnerError::Session(e.into()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::types::{LogMode, LogTarget};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream};
    use tokio::sync::oneshot;

    /// In-memory session: the test plays the child by writing into the duplex ends and
    /// resolving `exit`.
    struct FakeSession {
        stdout: Option<DuplexStream>,
        stderr: Option<DuplexStream>,
        exit: Option<oneshot::Receiver<i32>>,
        killed: bool,
    }

    struct FakeChild {
        stdout: DuplexStream,
        stderr: DuplexStream,
        exit: oneshot::Sender<i32>,
    }

    fn fake() -> (Box<dyn RunnerSession>, FakeChild) {
        let (out_wr, out_rd) = tokio::io::duplex(256);
        let (err_wr, err_rd) = tokio::io::duplex(256);
        let (exit_tx, exit_rx) = oneshot::channel();
        (
            Box::new(FakeSession {
                stdout: Some(out_rd),
                stderr: Some(err_rd),
                exit: Some(exit_rx),
                killed: false,
            }),
            FakeChild {
                stdout: out_wr,
                stderr: err_wr,
                exit: exit_tx,
            },
        )
    }

    #[async_trait]
    impl RunnerSession for FakeSession {
        fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
            self.stdout
                .take()
                .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
        }

        fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
            self.stderr
                .take()
                .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
        }

        async fn kill(&mut self) -> anyhow::Result<()> {
            self.killed = true;
            self.exit = None;
            Ok(())
        }

        async fn wait(&mut self) -> anyhow::Result<Termination> {
            if self.killed {
                return Ok(Termination::Signaled(9));
            }
            match self.exit.as_mut() {
                Some(rx) => Ok(Termination::Exited(rx.await?)),
                None => anyhow::bail!("already reaped"),
            }
        }
    }

    fn input<'a>(
        session: Box<dyn RunnerSession>,
        cfg: &'a RunnerConfig,
        log: Option<LogSink>,
    ) -> RunSessionRuntimeInput<'a> {
        RunSessionRuntimeInput {
            session,
            cfg,
            suppress: Suppress::Both,
            log,
            timeout: None,
            run_id: "test-run",
            abort_rx: None,
        }
    }

    #[tokio::test]
    async fn collects_both_streams_into_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let target = LogTarget {
            path: dir.path().join("out.log"),
            mode: LogMode::Truncate,
        };
        let sink = tee::open_log(&target).await.unwrap();
        let cfg = RunnerConfig::default();
        let (session, mut child) = fake();

        let child_task = tokio::spawn(async move {
            child.stdout.write_all(b"to stdout\n").await.unwrap();
            child.stdout.flush().await.unwrap();
            child.stderr.write_all(b"to stderr\n").await.unwrap();
            drop(child.stdout);
            drop(child.stderr);
            let _ = child.exit.send(2);
        });

        let result = run_session_runtime(input(session, &cfg, Some(sink)))
            .await
            .unwrap();
        child_task.await.unwrap();

        assert_eq!(result.termination, Termination::Exited(2));
        assert_eq!(result.exit_code(), 2);
        assert_eq!(result.stdout_tail, "to stdout\n");
        assert_eq!(result.stderr_tail, "to stderr\n");
        assert_eq!(result.logged_bytes, 20);

        let logged = std::fs::read_to_string(&target.path).unwrap();
        assert!(logged.contains("to stdout\n"));
        assert!(logged.contains("to stderr\n"));
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let mut cfg = RunnerConfig::default();
        cfg.abort_grace_ms = 50;
        let (session, child) = fake();

        let mut inp = input(session, &cfg, None);
        inp.timeout = Some(Duration::from_millis(20));
        let result = run_session_runtime(inp).await.unwrap();

        assert_eq!(result.termination, Termination::TimedOut);
        assert_eq!(result.exit_code(), 124);
        drop(child);
    }

    #[tokio::test]
    async fn abort_message_interrupts_the_run() {
        let mut cfg = RunnerConfig::default();
        cfg.abort_grace_ms = 50;
        let (session, child) = fake();
        let (abort_tx, abort_rx) = mpsc::channel(1);

        let mut inp = input(session, &cfg, None);
        inp.abort_rx = Some(abort_rx);
        abort_tx.send("interrupted".to_string()).await.unwrap();
        let result = run_session_runtime(inp).await.unwrap();

        assert_eq!(result.termination, Termination::Interrupted);
        assert_eq!(result.exit_code(), 130);
        drop(child);
    }

    #[tokio::test]
    async fn open_pipes_do_not_outlive_the_drain_grace() {
        let mut cfg = RunnerConfig::default();
        cfg.drain_grace_ms = 50;
        let (session, mut child) = fake();

        // Something left behind keeps writing and never closes stdout.
        child.stdout.write_all(b"still here\n").await.unwrap();
        let _ = child.exit.send(0);

        let started = Instant::now();
        let result = run_session_runtime(input(session, &cfg, None)).await.unwrap();

        assert!(result.success());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(result.stdout_tail, "still here\n");
        drop(child.stdout);
    }

    #[tokio::test]
    async fn dropped_abort_sender_does_not_end_the_run() {
        let cfg = RunnerConfig::default();
        let (session, child) = fake();
        let (abort_tx, abort_rx) = mpsc::channel::<String>(1);
        drop(abort_tx);

        let FakeChild {
            stdout,
            stderr,
            exit,
        } = child;
        drop(stdout);
        drop(stderr);
        let _ = exit.send(0);

        let mut inp = input(session, &cfg, None);
        inp.abort_rx = Some(abort_rx);
        let result = run_session_runtime(inp).await.unwrap();

        assert!(result.success());
    }
}
