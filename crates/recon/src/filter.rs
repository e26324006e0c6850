//! Loan filter: drop written-off and non-active loans, then project to the allow-list.

use crate::config::LoanConfig;
use crate::table::{Table, Value};

#[derive(Debug)]
pub struct FilterOutput {
    /// Surviving loans, projected to the allow-list columns present in the input.
    pub table: Table,
    /// Rows dropped because the write-off flag matched (checked first).
    pub written_off: usize,
    /// Rows dropped because the status was not active.
    pub inactive: usize,
    /// Allow-listed columns absent from the input, in allow-list order.
    pub missing_columns: Vec<String>,
}

/// Flag text as the filter sees it: a missing column or empty cell reads as
/// `""`, non-text cells have no text and never match.
fn flag_text(row: &[Value], idx: Option<usize>) -> Option<&str> {
    match idx.and_then(|i| row.get(i)) {
        None | Some(Value::Empty) => Some(""),
        Some(Value::Text(s)) => Some(s.as_str()),
        Some(_) => None,
    }
}

fn matches_flag(text: Option<&str>, expected: &str) -> bool {
    text.is_some_and(|t| t.to_lowercase() == expected.to_lowercase())
}

pub fn is_written_off(row: &[Value], idx: Option<usize>, config: &LoanConfig) -> bool {
    matches_flag(flag_text(row, idx), &config.writeoff_value)
}

pub fn is_active(row: &[Value], idx: Option<usize>, config: &LoanConfig) -> bool {
    matches_flag(flag_text(row, idx), &config.active_value)
}

pub fn filter_loans(loans: &Table, config: &LoanConfig) -> FilterOutput {
    let writeoff_idx = loans.column_index(&config.writeoff_column);
    let status_idx = loans.column_index(&config.status_column);

    let mut kept: Vec<(String, usize)> = Vec::new();
    let mut missing_columns = Vec::new();
    for name in &config.allow_list {
        match loans.column_index(name) {
            Some(idx) => kept.push((name.clone(), idx)),
            None => missing_columns.push(name.clone()),
        }
    }

    let mut table = Table::new(kept.iter().map(|(name, _)| name.clone()).collect());
    let mut written_off = 0;
    let mut inactive = 0;

    for row in loans.rows() {
        if is_written_off(row, writeoff_idx, config) {
            written_off += 1;
            continue;
        }
        if !is_active(row, status_idx, config) {
            inactive += 1;
            continue;
        }
        table.push_row(kept.iter().map(|(_, idx)| row[*idx].clone()).collect());
    }

    FilterOutput {
        table,
        written_off,
        inactive,
        missing_columns,
    }
}
