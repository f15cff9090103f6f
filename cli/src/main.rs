use clap::Parser;
use shush::app;
use shush::commands::cli;
use shush_core::api::{CliError, LoggingConfig, RunnerError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            // The child's output is suppressed; ours never is.
            eprintln!("shush: {e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = shush_core::api::load(args.config.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    tracing::debug!(command = ?args.command, "starting");
    app::run_app(args, &cfg).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 64: no command
    // 70: internal/uncategorized
    // 74: log file or stream IO error
    // 78: config error
    // 126: command found but could not be started
    // 127: command not found
    match e {
        CliError::Config(_) => 78,
        CliError::Runner(re) => match re {
            RunnerError::Config(_) => 64,
            RunnerError::Spawn { .. } if re.is_not_found() => 127,
            RunnerError::Spawn { .. } => 126,
            RunnerError::StreamIo { .. } => 74,
            RunnerError::LogOpen { .. } => 74,
            RunnerError::LogWrite { .. } => 74,
            RunnerError::Session(_) => 70,
        },
        CliError::Io(_) => 74,
        CliError::Anyhow(_) => 70,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("shush"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("shush.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
