use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

// Usage first, so `shush --help` output starts with "Usage: shush".
const HELP_TEMPLATE: &str = "\
{usage-heading} {usage}

{about}

{all-args}{after-help}";

const AFTER_HELP: &str = "\
Examples:
  shush -- make build            run quietly, always exit 0
  shush -r -- ./deploy.sh        run quietly, exit with the script's code
  shush -l build.log -- cargo b  keep stdout+stderr in build.log";

#[derive(Parser, Debug)]
#[command(
    name = "shush",
    version,
    about = "Run a command and keep its output off the terminal",
    help_template = HELP_TEMPLATE,
    after_help = AFTER_HELP,
    arg_required_else_help = true
)]
pub struct Args {
    /// Exit with the command's exit code instead of 0.
    #[arg(short = 'r', long = "return-code")]
    pub return_code: bool,

    /// Print the command's exit code on stdout when it finishes.
    #[arg(short = 'p', long = "print-code")]
    pub print_code: bool,

    /// Write the command's stdout and stderr to FILE.
    #[arg(short = 'l', long = "log", value_name = "FILE", value_parser = clap::value_parser!(PathBuf))]
    pub log: Option<PathBuf>,

    /// Append to the log file instead of truncating it.
    #[arg(short = 'a', long, requires = "log")]
    pub append: bool,

    /// Suppress only stdout; stderr still reaches the terminal.
    #[arg(short = 'o', long = "stdout-only", conflicts_with = "stderr_only")]
    pub stdout_only: bool,

    /// Suppress only stderr; stdout still reaches the terminal.
    #[arg(short = 'e', long = "stderr-only")]
    pub stderr_only: bool,

    /// Kill the command after SECS seconds (0 disables).
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Config file to use instead of the default lookup.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Command to run and its arguments, usually after `--`.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        value_parser = clap::value_parser!(OsString)
    )]
    pub command: Vec<OsString>,
}
