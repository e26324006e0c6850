use std::collections::BTreeMap;

use crate::config::LedgerConfig;
use crate::error::{Input, ReconError};
use crate::table::{Table, Value};

/// Summed accrual debits for one account number.
#[derive(Debug, Clone, PartialEq)]
pub struct AccrualTotal {
    pub account: Value,
    pub total: f64,
    pub record_count: usize,
}

#[derive(Debug)]
pub struct AccrualOutput {
    /// One total per distinct account, ordered by account value.
    pub totals: Vec<AccrualTotal>,
    pub ledger_rows: usize,
    /// Ledger rows whose description matched the accrual description.
    pub accrual_rows: usize,
}

/// Ledger column positions, resolved against whitespace-trimmed names.
struct LedgerColumns {
    desc: usize,
    account: usize,
    debit: usize,
}

fn resolve_ledger_columns(ledger: &Table, config: &LedgerConfig) -> Result<LedgerColumns, ReconError> {
    let names = ledger.trimmed_columns();
    let idx = |name: &str| -> Result<usize, ReconError> {
        names
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| ReconError::missing_column(Input::Ledger, name))
    };

    Ok(LedgerColumns {
        desc: idx(&config.desc_column)?,
        account: idx(&config.account_column)?,
        debit: idx(&config.debit_column)?,
    })
}

fn is_accrual(desc: &Value, accrual_desc: &str) -> bool {
    desc.as_text()
        .is_some_and(|d| d.to_uppercase() == accrual_desc.to_uppercase())
}

/// Filter ledger rows to the accrual description and sum debits per account.
///
/// Rows with an empty account are skipped and empty debits count as zero.
/// A debit that is neither a number nor numeric text fails the run.
pub fn aggregate_accruals(ledger: &Table, config: &LedgerConfig) -> Result<AccrualOutput, ReconError> {
    let cols = resolve_ledger_columns(ledger, config)?;
    let debit_name = ledger.columns()[cols.debit].trim();

    let mut groups: BTreeMap<&Value, (f64, usize)> = BTreeMap::new();
    let mut accrual_rows = 0;

    for (i, row) in ledger.rows().iter().enumerate() {
        if !is_accrual(&row[cols.desc], &config.accrual_desc) {
            continue;
        }
        accrual_rows += 1;

        let account = &row[cols.account];
        if account.is_empty() {
            continue;
        }

        let debit = &row[cols.debit];
        let amount = if debit.is_empty() {
            0.0
        } else {
            debit.to_f64().ok_or_else(|| ReconError::Value {
                input: Input::Ledger,
                row: i + 2,
                column: debit_name.to_string(),
                value: debit.to_string(),
            })?
        };

        let entry = groups.entry(account).or_insert((0.0, 0));
        entry.0 += amount;
        entry.1 += 1;
    }

    let totals = groups
        .into_iter()
        .map(|(account, (total, record_count))| AccrualTotal {
            account: account.clone(),
            total,
            record_count,
        })
        .collect();

    Ok(AccrualOutput {
        totals,
        ledger_rows: ledger.len(),
        accrual_rows,
    })
}
