// loanbook CLI - reconcile a loan portfolio against ARC transfers and LMS053 accruals

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "loanbook")]
#[command(about = "Loan portfolio reconciliation: write-offs, ARC exclusion, accruals, AUM")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the three inputs and write the portfolio workbook
    #[command(after_help = "\
Exit codes: 0 ok, 2 usage, 3 file I/O, 60 invalid config, 61 missing column, \
62 non-numeric value, 63 other pipeline failure. No workbook is written on failure.

Examples:
  loanbook run --loans loans.xlsx --arc arc.xlsx --ledger LMS053.xlsx
  loanbook run --loans loans.csv --arc arc.csv --ledger lms053.csv --output out/Loan_Portfolio.xlsx
  loanbook run --loans loans.xlsx --arc arc.xlsx --ledger LMS053.xlsx --sheet-ledger Detail --json
  loanbook run --config branch.toml --loans l.xlsx --arc a.xlsx --ledger g.xlsx --summary-json run.json")]
    Run(recon::RunArgs),

    /// Validate a pipeline config without running
    #[command(after_help = "\
Examples:
  loanbook validate branch.toml")]
    Validate {
        /// Path to the pipeline .toml config
        config: PathBuf,
    },

    /// Show the output column layout and the AUM formula inputs
    #[command(after_help = "\
Examples:
  loanbook columns
  loanbook columns --config branch.toml --json")]
    Columns {
        /// Pipeline config (.toml); built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("LOANBOOK_GIT_HASH"), ")",
            "\nengine:  loanbook-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("LOANBOOK_TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("LOANBOOK_GIT_HASH"), ")",
            "\nengine:  loanbook-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("LOANBOOK_TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let default = if verbose > 0 { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Columns { config, json } => recon::cmd_columns(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }
}
