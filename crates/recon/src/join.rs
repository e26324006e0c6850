use std::collections::HashMap;

use crate::aggregate::AccrualTotal;
use crate::error::{Input, ReconError};
use crate::table::{Table, Value};

#[derive(Debug)]
pub struct JoinOutput {
    /// Input loans with the accrual column appended last.
    pub table: Table,
    /// Loans that found an accrual total.
    pub matched: usize,
}

/// Left-join accrual totals onto loans by exact account value.
///
/// Row count and order are preserved. Loans with no total, or with an empty
/// account, get `0`.
pub fn join_accruals(
    mut loans: Table,
    totals: &[AccrualTotal],
    account_column: &str,
    accrual_column: &str,
) -> Result<JoinOutput, ReconError> {
    let idx = loans
        .column_index(account_column)
        .ok_or_else(|| ReconError::missing_column(Input::Loans, account_column))?;

    let lookup: HashMap<&Value, f64> = totals.iter().map(|t| (&t.account, t.total)).collect();

    let mut matched = 0;
    let values: Vec<Value> = loans
        .rows()
        .iter()
        .map(|row| {
            let total = lookup.get(&row[idx]).copied();
            if total.is_some() {
                matched += 1;
            }
            Value::number(total.unwrap_or(0.0))
        })
        .collect();

    loans.push_column(accrual_column, values)?;
    Ok(JoinOutput { table: loans, matched })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(account: Value, total: f64) -> AccrualTotal {
        AccrualTotal { account, total, record_count: 1 }
    }

    #[test]
    fn appends_totals_and_zero_fills() {
        let loans = Table::with_rows(
            vec!["loan_account_number".into(), "customer_name".into()],
            vec![
                vec!["L2".into(), "b".into()],
                vec!["L1".into(), "a".into()],
                vec!["L9".into(), "z".into()],
                vec![Value::Empty, "e".into()],
                vec!["L1".into(), "a2".into()],
            ],
        );
        let totals = vec![total("L1".into(), 125.5), total("L2".into(), 10.0), total("L7".into(), 3.0)];

        let out = join_accruals(loans, &totals, "loan_account_number", "Accrual_Amount").unwrap();
        assert_eq!(out.table.columns().last().map(String::as_str), Some("Accrual_Amount"));
        assert_eq!(out.table.len(), 5);

        let accruals: Vec<Value> = out.table.column_values(2).cloned().collect();
        assert_eq!(
            accruals,
            vec![
                Value::number(10.0),
                Value::number(125.5),
                Value::number(0.0),
                Value::number(0.0),
                Value::number(125.5),
            ]
        );
        assert_eq!(out.matched, 3);
        // Order preserved
        assert_eq!(out.table.cell(0, 1), &Value::text("b"));
    }

    #[test]
    fn numeric_accounts_match_numeric_totals_only() {
        let loans = Table::with_rows(
            vec!["loan_account_number".into()],
            vec![vec![1001.0.into()], vec!["1001".into()]],
        );
        let totals = vec![total(1001.0.into(), 7.0)];
        let out = join_accruals(loans, &totals, "loan_account_number", "Accrual_Amount").unwrap();
        assert_eq!(out.table.cell(0, 1), &Value::number(7.0));
        assert_eq!(out.table.cell(1, 1), &Value::number(0.0));
    }

    #[test]
    fn empty_loans_get_the_column() {
        let loans = Table::new(vec!["loan_account_number".into()]);
        let out = join_accruals(loans, &[], "loan_account_number", "Accrual_Amount").unwrap();
        assert!(out.table.is_empty());
        assert_eq!(out.table.width(), 2);
    }
}
