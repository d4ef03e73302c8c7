// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod commands;
mod logging;
mod output;

use bijux_watchlist_core::{
    load_watchlist_config, ExitCode, MachineError, ResultExt, WatchlistConfig,
};
use bijux_watchlist_model::Delimiter;
use clap::{error::ErrorKind, ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

const BIJUX_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "bijux-watchlist", version)]
#[command(about = "Validate CSV files and reconcile them into remote watchlists")]
#[command(help_template = BIJUX_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  BIJUX_LOG_LEVEL                   Log filter override\n  BIJUX_LOG_JSON                    Emit logs as JSON\n  BIJUX_WATCHLIST_BASE_URL          Management API base url\n  BIJUX_WATCHLIST_TOKEN             Bearer token attached to requests\n  BIJUX_WATCHLIST_SETTLE_DELAY_MS   Wait after delete before recreate"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,
    #[arg(long = "log-json", global = true, default_value_t = false)]
    log_json: bool,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a CSV file without contacting the remote store.
    Validate {
        file: PathBuf,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Show what a deployment would do without changing anything.
    Plan(DeployArgs),
    /// Reconcile a CSV file into the remote watchlist.
    Deploy(DeployArgs),
    /// Print the effective configuration and the config file locations.
    Config,
}

#[derive(Args, Clone)]
struct InputArgs {
    #[arg(long, value_enum)]
    delimiter: Option<DelimiterCli>,
    #[arg(long = "fail-on-warn", default_value_t = false)]
    fail_on_warn: bool,
    #[arg(long = "max-cell-length")]
    max_cell_length: Option<usize>,
}

#[derive(Args, Clone)]
struct DeployArgs {
    #[arg(long)]
    file: PathBuf,
    /// Scope path that owns the container, e.g. subscriptions/<id>/resourceGroups/<rg>.
    #[arg(long)]
    scope: String,
    /// Container (workspace) name.
    #[arg(long)]
    container: String,
    #[arg(long)]
    alias: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long = "display-name")]
    display_name: Option<String>,
    #[arg(long = "search-key")]
    search_key: Option<String>,
    #[arg(long = "base-url")]
    base_url: Option<String>,
    #[arg(long)]
    provider: Option<String>,
    #[arg(long = "source-name")]
    source_name: Option<String>,
    #[arg(long = "settle-delay-ms")]
    settle_delay_ms: Option<u64>,
    #[arg(long)]
    report: Option<PathBuf>,
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DelimiterCli {
    Comma,
    Semicolon,
    Tab,
}

impl From<DelimiterCli> for Delimiter {
    fn from(value: DelimiterCli) -> Self {
        match value {
            DelimiterCli::Comma => Self::Comma,
            DelimiterCli::Semicolon => Self::Semicolon,
            DelimiterCli::Tab => Self::Tab,
        }
    }
}

#[derive(Clone, Copy)]
struct LogFlags {
    quiet: bool,
    verbose: u8,
    trace: bool,
    json: bool,
}

#[derive(Clone, Copy)]
struct OutputMode {
    json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    let output_mode = OutputMode { json: cli.json };
    logging::init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.log_json,
    });

    let command = cli.command.ok_or_else(|| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new("usage_error", "missing command; see --help"),
    })?;
    let config = load_config(cli.config.as_deref())?;

    match command {
        Commands::Validate { file, input } => commands::run_validate(&file, &input, &config, output_mode),
        Commands::Plan(args) => commands::run_plan(&args, &config, output_mode),
        Commands::Deploy(args) => commands::run_deploy(&args, &config, output_mode),
        Commands::Config => commands::run_config(&config, cli.config.as_deref(), output_mode),
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<WatchlistConfig, CliError> {
    load_watchlist_config(explicit)
        .with_context("load configuration")
        .map_err(|e| CliError::usage("config_error", &e.to_string()))
}

struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", &message),
        }
    }

    fn usage(code: &str, message: &str) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new(code, message),
        }
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine.message);
    }
}
