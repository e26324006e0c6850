//! AUM derivation: one computed column layered on top of the joined portfolio.

use crate::config::{positions, AumMode, PipelineConfig};
use crate::error::{Input, ReconError};
use crate::table::{Table, Value};

/// `max(principal - (pending + excess), 0) + accrual`
///
/// The clamp applies before the accrual is added, so a loan whose deductions
/// exceed its principal still carries its accrual.
pub fn aum(principal: f64, pending: f64, excess: f64, accrual: f64) -> f64 {
    (principal - (pending + excess)).max(0.0) + accrual
}

/// One resolved formula input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AumInput {
    pub index: usize,
    pub name: String,
}

/// Where the four formula inputs live in the joined table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AumColumns {
    pub principal: AumInput,
    pub pending: AumInput,
    pub excess: AumInput,
    pub accrual: AumInput,
}

impl AumColumns {
    fn inputs(&self) -> [&AumInput; 4] {
        [&self.principal, &self.pending, &self.excess, &self.accrual]
    }
}

/// Locate the formula inputs once per run.
pub fn resolve_aum_columns(table: &Table, config: &PipelineConfig) -> Result<AumColumns, ReconError> {
    match config.aum.mode {
        AumMode::Named => {
            let find = |name: &str| -> Result<AumInput, ReconError> {
                table
                    .column_index(name)
                    .map(|index| AumInput { index, name: name.to_string() })
                    .ok_or_else(|| ReconError::missing_column(Input::Portfolio, name))
            };
            Ok(AumColumns {
                principal: find(&config.aum.principal)?,
                pending: find(&config.aum.pending)?,
                excess: find(&config.aum.excess)?,
                accrual: find(config.aum_accrual_column())?,
            })
        }
        AumMode::Positional => {
            if table.width() < positions::MIN_COLUMNS {
                return Err(ReconError::schema(
                    Input::Portfolio,
                    format!(
                        "positional AUM mapping needs at least {} columns, found {}",
                        positions::MIN_COLUMNS,
                        table.width()
                    ),
                ));
            }
            let at = |index: usize| AumInput {
                index,
                name: table.columns()[index].clone(),
            };
            Ok(AumColumns {
                principal: at(positions::PRINCIPAL),
                pending: at(positions::PENDING),
                excess: at(positions::EXCESS),
                accrual: at(positions::ACCRUAL),
            })
        }
    }
}

#[derive(Debug)]
pub struct AumOutput {
    /// Joined portfolio with the AUM column appended last.
    pub table: Table,
    pub columns: AumColumns,
    /// Sum of every non-empty AUM cell.
    pub total_aum: f64,
}

/// Append the AUM column.
///
/// An empty formula input leaves that row's AUM empty. Any other input that is
/// not numeric fails the run with the offending sheet row.
pub fn derive_aum(mut table: Table, config: &PipelineConfig) -> Result<AumOutput, ReconError> {
    let columns = resolve_aum_columns(&table, config)?;
    log::debug!(
        "AUM inputs ({} mapping): principal='{}' pending='{}' excess='{}' accrual='{}'",
        config.aum.mode,
        columns.principal.name,
        columns.pending.name,
        columns.excess.name,
        columns.accrual.name,
    );

    let mut values = Vec::with_capacity(table.len());
    let mut total_aum = 0.0;

    for (i, row) in table.rows().iter().enumerate() {
        let mut numbers = [0.0; 4];
        let mut has_empty = false;
        for (slot, input) in numbers.iter_mut().zip(columns.inputs()) {
            let cell = &row[input.index];
            if cell.is_empty() {
                has_empty = true;
                continue;
            }
            *slot = cell.to_f64().ok_or_else(|| ReconError::Value {
                input: Input::Portfolio,
                row: i + 2,
                column: input.name.clone(),
                value: cell.to_string(),
            })?;
        }

        if has_empty {
            values.push(Value::Empty);
        } else {
            let [principal, pending, excess, accrual] = numbers;
            let value = aum(principal, pending, excess, accrual);
            total_aum += value;
            values.push(Value::number(value));
        }
    }

    table.push_column(config.output.aum_column.clone(), values)?;
    Ok(AumOutput { table, columns, total_aum })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ALLOW_LIST;

    fn named_table(rows: Vec<Vec<Value>>) -> Table {
        Table::with_rows(
            vec![
                "loan_account_number".into(),
                "pending_amount".into(),
                "principal_outstanding".into(),
                "total_excess_money".into(),
                "Accrual_Amount".into(),
            ],
            rows,
        )
    }

    fn loan(principal: Value, pending: Value, excess: Value, accrual: Value) -> Vec<Value> {
        vec!["L1".into(), pending, principal, excess, accrual]
    }

    #[test]
    fn formula_clamps_before_adding_accrual() {
        assert_eq!(aum(100.0, 30.0, 20.0, 5.0), 55.0);
        assert_eq!(aum(10.0, 30.0, 20.0, 5.0), 5.0);
        assert_eq!(aum(50.0, 30.0, 20.0, 0.0), 0.0);
    }

    #[test]
    fn named_mapping_appends_aum() {
        let table = named_table(vec![
            loan(100.0.into(), 30.0.into(), 20.0.into(), 5.0.into()),
            loan(10.0.into(), 30.0.into(), 20.0.into(), 5.0.into()),
        ]);
        let out = derive_aum(table, &PipelineConfig::default()).unwrap();

        assert_eq!(out.table.columns().last().map(String::as_str), Some("AUM"));
        assert_eq!(out.table.cell(0, 5), &Value::number(55.0));
        assert_eq!(out.table.cell(1, 5), &Value::number(5.0));
        assert_eq!(out.total_aum, 60.0);
        assert_eq!(out.columns.principal.name, "principal_outstanding");
    }

    #[test]
    fn numeric_text_inputs_are_accepted() {
        let table = named_table(vec![loan("100".into(), " 30 ".into(), 20.0.into(), 5.0.into())]);
        let out = derive_aum(table, &PipelineConfig::default()).unwrap();
        assert_eq!(out.table.cell(0, 5), &Value::number(55.0));
    }

    #[test]
    fn empty_input_leaves_aum_empty() {
        let table = named_table(vec![
            loan(Value::Empty, 30.0.into(), 20.0.into(), 5.0.into()),
            loan(100.0.into(), 0.0.into(), 0.0.into(), 1.0.into()),
        ]);
        let out = derive_aum(table, &PipelineConfig::default()).unwrap();
        assert_eq!(out.table.cell(0, 5), &Value::Empty);
        assert_eq!(out.total_aum, 101.0);
    }

    #[test]
    fn non_numeric_input_is_value_error() {
        let table = named_table(vec![
            loan(100.0.into(), 0.0.into(), 0.0.into(), 0.0.into()),
            loan(100.0.into(), "pending".into(), 0.0.into(), 0.0.into()),
        ]);
        let err = derive_aum(table, &PipelineConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "portfolio, row 3: column 'pending_amount' is not numeric: 'pending'"
        );
    }

    #[test]
    fn bool_input_is_value_error() {
        let table = named_table(vec![loan(Value::Bool(true), 0.0.into(), 0.0.into(), 0.0.into())]);
        assert!(matches!(
            derive_aum(table, &PipelineConfig::default()),
            Err(ReconError::Value { .. })
        ));
    }

    #[test]
    fn named_mapping_requires_every_input() {
        let table = Table::new(vec!["loan_account_number".into(), "Accrual_Amount".into()]);
        let err = derive_aum(table, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, ReconError::Schema { input: Input::Portfolio, .. }));
        assert!(err.to_string().contains("principal_outstanding"));
    }

    #[test]
    fn accrual_override_is_honoured() {
        let mut config = PipelineConfig::default();
        config.aum.accrual = Some("accrued".into());
        let table = Table::with_rows(
            vec![
                "pending_amount".into(),
                "principal_outstanding".into(),
                "total_excess_money".into(),
                "accrued".into(),
            ],
            vec![vec![1.0.into(), 10.0.into(), 1.0.into(), 2.0.into()]],
        );
        let out = derive_aum(table, &config).unwrap();
        assert_eq!(out.table.cell(0, 4), &Value::number(10.0));
    }

    #[test]
    fn positional_mapping_uses_fixed_columns() {
        let mut columns: Vec<String> = DEFAULT_ALLOW_LIST.iter().map(|c| c.to_string()).collect();
        columns.push("Accrual_Amount".into());
        let mut row = vec![Value::Empty; columns.len()];
        row[positions::PRINCIPAL] = 100.0.into();
        row[positions::PENDING] = 30.0.into();
        row[positions::EXCESS] = 20.0.into();
        row[positions::ACCRUAL] = 5.0.into();

        let mut config = PipelineConfig::default();
        config.aum.mode = AumMode::Positional;
        let out = derive_aum(Table::with_rows(columns, vec![row]), &config).unwrap();

        assert_eq!(out.columns.accrual.name, "Accrual_Amount");
        assert_eq!(out.columns.excess.name, "total_excess_money");
        assert_eq!(out.table.cell(0, positions::MIN_COLUMNS), &Value::number(55.0));
    }

    #[test]
    fn positional_mapping_rejects_narrow_tables() {
        let mut config = PipelineConfig::default();
        config.aum.mode = AumMode::Positional;
        let columns: Vec<String> = (0..positions::MIN_COLUMNS - 1).map(|i| format!("c{i}")).collect();
        let err = derive_aum(Table::new(columns), &config).unwrap_err();
        assert!(err.to_string().contains("at least 46 columns, found 45"));
    }
}
