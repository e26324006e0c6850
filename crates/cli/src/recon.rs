//! `loanbook run`, `loanbook validate`, `loanbook columns`: portfolio reconciliation commands.

use std::path::{Path, PathBuf};

use clap::Args;
use loanbook_io::{LoadOptions, OUTPUT_FILE_NAME};
use loanbook_recon::config::{positions, AumMode, PipelineConfig};
use loanbook_recon::{Input, ReconError, ReconInput, Table};
use serde_json::json;

use crate::exit_codes::{recon_exit_code, EXIT_IO, EXIT_RECON_RUNTIME};
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Loan portfolio extract (xlsx, xls, ods, csv)
    #[arg(long)]
    loans: PathBuf,

    /// ARC reference file (accounts transferred out)
    #[arg(long)]
    arc: PathBuf,

    /// LMS053 general-ledger extract
    #[arg(long)]
    ledger: PathBuf,

    /// Pipeline config (.toml); built-in defaults when omitted
    #[arg(long, env = "LOANBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Output workbook
    #[arg(long, short, default_value = OUTPUT_FILE_NAME)]
    output: PathBuf,

    /// Print the run summary as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Write the run summary JSON to a file
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Sheet to read from the loan portfolio workbook (default: first)
    #[arg(long)]
    sheet_loans: Option<String>,

    /// Sheet to read from the ARC workbook (default: first)
    #[arg(long)]
    sheet_arc: Option<String>,

    /// Sheet to read from the LMS053 workbook (default: first)
    #[arg(long)]
    sheet_ledger: Option<String>,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Engine error with a hint where the fix is usually obvious.
fn engine_err(err: ReconError, config: &PipelineConfig) -> CliError {
    let hint = match &err {
        ReconError::Schema { input: Input::Arc, .. } => Some(format!(
            "the ARC file needs a column whose name contains '{}' (set arc.account_token to change it)",
            config.arc.account_token
        )),
        ReconError::Schema { input: Input::Portfolio, .. } if config.aum.mode == AumMode::Positional => {
            Some("positional AUM needs the full default allow-list; try [aum] mode = \"named\"".to_string())
        }
        ReconError::Schema { input: Input::Portfolio, .. } => {
            Some("AUM inputs must be allow-listed loan columns (see `loanbook columns`)".to_string())
        }
        _ => None,
    };
    CliError { code: recon_exit_code(&err), message: err.to_string(), hint }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, CliError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_IO, format!("cannot read config {}: {e}", path.display())))?;
    PipelineConfig::from_toml(&config_str).map_err(|e| CliError {
        code: recon_exit_code(&e),
        message: format!("{}: {e}", path.display()),
        hint: None,
    })
}

fn load_input(label: &str, path: &Path, sheet: Option<String>) -> Result<Table, CliError> {
    let options = LoadOptions { sheet, ..LoadOptions::default() };
    let table = loanbook_io::load_table(path, &options)
        .map_err(|e| recon_err(EXIT_IO, format!("{label}: {e}")))?;
    log::info!("{label}: {} rows, {} columns from {}", table.len(), table.width(), path.display());
    Ok(table)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let is_xlsx = args
        .output
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if !is_xlsx {
        return Err(CliError::args(format!(
            "--output must be an .xlsx file, got {}",
            args.output.display()
        )));
    }

    let config = load_config(args.config.as_deref())?;

    let input = ReconInput {
        loans: load_input("loan portfolio", &args.loans, args.sheet_loans)?,
        arc: load_input("ARC file", &args.arc, args.sheet_arc)?,
        ledger: load_input("LMS053 ledger", &args.ledger, args.sheet_ledger)?,
    };

    let result = loanbook_recon::run(&config, input).map_err(|e| engine_err(e, &config))?;

    // Workbook is only written once the whole pipeline has succeeded
    loanbook_io::export_xlsx(&result.portfolio, &args.output)
        .map_err(|e| recon_err(EXIT_IO, e.to_string()))?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.summary_json {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_IO, format!("cannot write {}: {e}", path.display())))?;
    }

    if args.json {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!("{}", result.summary.describe());
    if !result.summary.missing_columns.is_empty() {
        eprintln!(
            "note: {} allow-listed column(s) not in the loan portfolio: {}",
            result.summary.missing_columns.len(),
            result.summary.missing_columns.join(", ")
        );
    }
    eprintln!("wrote {}", args.output.display());

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    let name = if config.name.is_empty() { "(unnamed)" } else { config.name.as_str() };
    eprintln!(
        "{}: valid ({name}, {} allow-listed columns, {} AUM mapping)",
        config_path.display(),
        config.loans.allow_list.len(),
        config.aum.mode
    );
    Ok(())
}

pub fn cmd_columns(config_path: Option<PathBuf>, json_output: bool) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;

    let (principal, pending, excess, accrual) = match config.aum.mode {
        AumMode::Named => (
            config.aum.principal.clone(),
            config.aum.pending.clone(),
            config.aum.excess.clone(),
            config.aum_accrual_column().to_string(),
        ),
        AumMode::Positional => (
            format!("#{}", positions::PRINCIPAL),
            format!("#{}", positions::PENDING),
            format!("#{}", positions::EXCESS),
            format!("#{}", positions::ACCRUAL),
        ),
    };

    if json_output {
        let out = json!({
            "allow_list": config.loans.allow_list,
            "accrual_column": config.output.accrual_column,
            "aum_column": config.output.aum_column,
            "aum": {
                "mode": config.aum.mode.to_string(),
                "principal": principal,
                "pending": pending,
                "excess": excess,
                "accrual": accrual,
            },
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    for (i, column) in config.loans.allow_list.iter().enumerate() {
        println!("{i:>3}  {column}");
    }
    let next = config.loans.allow_list.len();
    println!("{next:>3}  {}  (accrual)", config.output.accrual_column);
    println!("{:>3}  {}  (derived)", next + 1, config.output.aum_column);
    println!();
    println!(
        "{} = max({principal} - ({pending} + {excess}), 0) + {accrual}  [{} mapping]",
        config.output.aum_column, config.aum.mode
    );
    Ok(())
}
