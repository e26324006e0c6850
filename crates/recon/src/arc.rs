//! ARC exclusion: drop loans whose account number appears in the ARC reference.

use std::collections::HashSet;

use crate::error::{Input, ReconError};
use crate::table::{Table, Value};

/// Outcome of locating the ARC account-number column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    /// Position and trimmed name of the first matching column.
    Found { index: usize, name: String },
    NotFound,
}

/// First column (original order) whose trimmed, lower-cased name contains `token`.
pub fn resolve_account_column(arc: &Table, token: &str) -> ColumnResolution {
    let token = token.to_lowercase();
    arc.trimmed_columns()
        .into_iter()
        .enumerate()
        .find(|(_, name)| name.to_lowercase().contains(&token))
        .map(|(index, name)| ColumnResolution::Found {
            index,
            name: name.to_string(),
        })
        .unwrap_or(ColumnResolution::NotFound)
}

/// Distinct non-empty values of one ARC column.
pub fn account_set(arc: &Table, index: usize) -> HashSet<&Value> {
    arc.column_values(index).filter(|v| !v.is_empty()).collect()
}

#[derive(Debug)]
pub struct ArcOutput {
    pub table: Table,
    pub excluded: usize,
}

/// Remove every loan whose `account_column` value exactly equals a value in
/// the resolved ARC column. Empty loan accounts are never excluded.
pub fn exclude_arc(
    mut loans: Table,
    account_column: &str,
    arc: &Table,
    arc_index: usize,
) -> Result<ArcOutput, ReconError> {
    let loan_idx = loans
        .column_index(account_column)
        .ok_or_else(|| ReconError::missing_column(Input::Loans, account_column))?;

    let accounts = account_set(arc, arc_index);
    let before = loans.len();
    loans.retain_rows(|row| {
        let key = &row[loan_idx];
        key.is_empty() || !accounts.contains(key)
    });

    Ok(ArcOutput {
        excluded: before - loans.len(),
        table: loans,
    })
}
