use std::path::{Path, PathBuf};
use std::time::Duration;

use shush_core::api::{
    exit_code_for_result, run_command, AppConfig, CliError, LogMode, LogTarget, RunRequest,
    RunnerConfig, Suppress,
};
use tokio::sync::mpsc;

use crate::commands::cli::Args;

/// Translate parsed flags (with config defaults filled in) into a runner request.
pub fn build_request(args: &Args, cfg: &RunnerConfig) -> RunRequest {
    let suppress = if args.stdout_only {
        Suppress::StdoutOnly
    } else if args.stderr_only {
        Suppress::StderrOnly
    } else {
        Suppress::Both
    };

    let log = args.log.as_deref().map(|raw| LogTarget {
        path: expand_log_path(raw),
        mode: if args.append || cfg.append_log {
            LogMode::Append
        } else {
            LogMode::Truncate
        },
    });

    let timeout = match args.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => cfg.timeout(),
    };

    RunRequest {
        command: args.command.clone(),
        suppress,
        log,
        timeout,
        abort_rx: None,
    }
}

// Only UTF-8 paths can carry a `~` worth expanding; anything else is used as given.
fn expand_log_path(raw: &Path) -> PathBuf {
    match raw.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => raw.to_path_buf(),
    }
}

pub async fn run_app(args: Args, cfg: &AppConfig) -> Result<i32, CliError> {
    let propagate = args.return_code || cfg.runner.return_code;
    let mut request = build_request(&args, &cfg.runner);

    let (abort_tx, abort_rx) = mpsc::channel::<String>(1);
    request.abort_rx = Some(abort_rx);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = abort_tx.send("interrupted".to_string()).await;
        }
    });

    let result = run_command(request, &cfg.runner).await;
    ctrl_c.abort();
    let result = result?;

    if args.print_code {
        println!("{}", result.exit_code());
    }

    Ok(exit_code_for_result(&result, propagate))
}
