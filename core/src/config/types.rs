use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Diagnostics emitted by shush itself. Never mixed with the child's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "warn" or "shush_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

// Anything chattier would leak onto a terminal the user asked to keep quiet.
fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Default for `-r`.
    #[serde(default)]
    pub return_code: bool,

    /// Default for `-a`.
    #[serde(default)]
    pub append_log: bool,

    #[serde(default = "default_inherit_stdin")]
    pub inherit_stdin: bool,

    /// Size of the per-stream tail kept for diagnostics.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_log_channel_capacity")]
    pub log_channel_capacity: usize,

    #[serde(default = "default_abort_grace_ms")]
    pub abort_grace_ms: u64,

    /// How long to keep reading after the child exits. Background processes it left
    /// behind may hold the pipes open indefinitely.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,

    /// 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_inherit_stdin() -> bool {
    true
}

fn default_capture_bytes() -> usize {
    64 * 1024
}

fn default_chunk_size() -> usize {
    16 * 1024
}

fn default_log_channel_capacity() -> usize {
    256
}

fn default_abort_grace_ms() -> u64 {
    2_000
}

fn default_drain_grace_ms() -> u64 {
    1_000
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            return_code: false,
            append_log: false,
            inherit_stdin: default_inherit_stdin(),
            capture_bytes: default_capture_bytes(),
            chunk_size: default_chunk_size(),
            log_channel_capacity: default_log_channel_capacity(),
            abort_grace_ms: default_abort_grace_ms(),
            drain_grace_ms: default_drain_grace_ms(),
            timeout_secs: 0,
        }
    }
}

impl RunnerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn abort_grace(&self) -> Duration {
        Duration::from_millis(self.abort_grace_ms)
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }
}
