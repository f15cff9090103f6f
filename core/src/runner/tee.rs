use std::path::PathBuf;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;

use super::io_pump::LogChunk;
use super::types::{LogMode, LogTarget};

/// An opened log file, ready to receive chunks from both pumps.
#[derive(Debug)]
pub struct LogSink {
    pub path: PathBuf,
    mode: LogMode,
    file: File,
}

/// Open (or create) the log file. Parent directories are never created.
///
/// Existing content is left alone here; truncate mode only clears it in
/// [`LogSink::begin`], once the command has actually started.
pub async fn open_log(target: &LogTarget) -> Result<LogSink, RunnerError> {
    let mut opts = OpenOptions::new();
    match target.mode {
        LogMode::Truncate => opts.write(true).create(true),
        LogMode::Append => opts.append(true).create(true),
    };

    let file = opts
        .open(&target.path)
        .await
        .map_err(|source| RunnerError::LogOpen {
            path: target.path.clone(),
            source,
        })?;

    Ok(LogSink {
        path: target.path.clone(),
        mode: target.mode,
        file,
    })
}

impl LogSink {
    /// Drop the previous run's content in truncate mode.
    pub async fn begin(&mut self) -> Result<(), RunnerError> {
        if self.mode == LogMode::Truncate {
            self.file
                .set_len(0)
                .await
                .map_err(|source| RunnerError::LogOpen {
                    path: self.path.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Single writer task that owns the log file. Chunks land in the order received.
///
/// On a write error the task returns immediately; dropping the receiver tells the pumps
/// to stop forwarding.
pub fn spawn_log_writer(
    sink: LogSink,
    capacity: usize,
) -> (mpsc::Sender<LogChunk>, JoinHandle<Result<u64, RunnerError>>) {
    let (tx, mut rx) = mpsc::channel::<LogChunk>(capacity.max(1));

    let task = tokio::spawn(async move {
        let LogSink { path, mut file, .. } = sink;
        let mut total = 0u64;

        while let Some(chunk) = rx.recv().await {
            file.write_all(&chunk.bytes)
                .await
                .map_err(|source| RunnerError::LogWrite {
                    path: path.clone(),
                    source,
                })?;
            total += chunk.bytes.len() as u64;
        }

        file.flush()
            .await
            .map_err(|source| RunnerError::LogWrite { path, source })?;

        Ok(total)
    });

    (tx, task)
}
