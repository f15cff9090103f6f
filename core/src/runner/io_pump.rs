use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    fn label(self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

/// Raw bytes read from one of the child's streams, bound for the log file.
#[derive(Debug)]
pub struct LogChunk {
    pub bytes: Vec<u8>,
}

pub fn pump_stdout<R>(
    rd: R,
    ring: Arc<RingBytes>,
    log_tx: Option<mpsc::Sender<LogChunk>>,
    silent: bool,
    chunk_size: usize,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(
        rd,
        tokio::io::stdout(),
        ring,
        StreamKind::Stdout,
        log_tx,
        silent,
        chunk_size,
    )
}

pub fn pump_stderr<R>(
    rd: R,
    ring: Arc<RingBytes>,
    log_tx: Option<mpsc::Sender<LogChunk>>,
    silent: bool,
    chunk_size: usize,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(
        rd,
        tokio::io::stderr(),
        ring,
        StreamKind::Stderr,
        log_tx,
        silent,
        chunk_size,
    )
}

/// Drain `rd` to EOF. The pump never stops early on a destination failure, otherwise
/// the child could block on a full pipe.
fn pump<R, W>(
    mut rd: R,
    mut wr: W,
    ring: Arc<RingBytes>,
    stream: StreamKind,
    mut log_tx: Option<mpsc::Sender<LogChunk>>,
    silent: bool,
    chunk_size: usize,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; chunk_size.max(1)];
        let mut total = 0u64;
        let mut passthrough = !silent;

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: stream.label(),
                source: e,
            })?;
            if n == 0 {
                break;
            }

            ring.push(&buf[..n]);
            total += n as u64;

            if passthrough {
                if let Err(e) = wr.write_all(&buf[..n]).await {
                    tracing::warn!(
                        error.kind = "stream.passthrough_failed",
                        stream = stream.label(),
                        error.message = %e
                    );
                    passthrough = false;
                }
            }

            if let Some(tx) = log_tx.as_ref() {
                let chunk = LogChunk {
                    bytes: buf[..n].to_vec(),
                };
                // The writer only hangs up after a write error, which it reports itself.
                if tx.send(chunk).await.is_err() {
                    log_tx = None;
                }
            }
        }

        if passthrough {
            let _ = wr.flush().await;
        }

        Ok(total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn silent_pump_feeds_ring_and_log_only() {
        let (mut child_wr, child_rd) = tokio::io::duplex(1024);
        let (term_wr, mut term_rd) = tokio::io::duplex(1024);
        let ring = RingBytes::new(1024);
        let (tx, mut rx) = mpsc::channel::<LogChunk>(8);

        let task = pump(child_rd, term_wr, ring.clone(), StreamKind::Stdout, Some(tx), true, 64);

        child_wr.write_all(b"hello").await.unwrap();
        drop(child_wr);

        let chunk = rx.recv().await.expect("expected one chunk");
        assert_eq!(chunk.bytes, b"hello");
        assert_eq!(task.await.unwrap().unwrap(), 5);
        assert_eq!(ring.to_bytes(), b"hello");

        let mut seen = Vec::new();
        term_rd.read_to_end(&mut seen).await.unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn loud_pump_passes_bytes_through() {
        let (mut child_wr, child_rd) = tokio::io::duplex(1024);
        let (term_wr, mut term_rd) = tokio::io::duplex(1024);
        let ring = RingBytes::new(1024);

        let task = pump(child_rd, term_wr, ring, StreamKind::Stderr, None, false, 4);

        child_wr.write_all(b"warning: disk full\n").await.unwrap();
        drop(child_wr);

        assert_eq!(task.await.unwrap().unwrap(), 19);
        let mut seen = Vec::new();
        term_rd.read_to_end(&mut seen).await.unwrap();
        assert_eq!(seen, b"warning: disk full\n");
    }

    #[tokio::test]
    async fn keeps_draining_after_log_writer_hangs_up() {
        let (mut child_wr, child_rd) = tokio::io::duplex(64);
        let ring = RingBytes::new(16);
        let (tx, rx) = mpsc::channel::<LogChunk>(1);
        drop(rx);

        let task = pump(
            child_rd,
            tokio::io::sink(),
            ring,
            StreamKind::Stdout,
            Some(tx),
            true,
            8,
        );

        let payload = vec![b'x'; 4096];
        child_wr.write_all(&payload).await.unwrap();
        drop(child_wr);

        assert_eq!(task.await.unwrap().unwrap(), 4096);
    }
}
