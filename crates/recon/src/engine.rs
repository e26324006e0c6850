use crate::aggregate::aggregate_accruals;
use crate::arc::{exclude_arc, resolve_account_column, ColumnResolution};
use crate::config::PipelineConfig;
use crate::derived::derive_aum;
use crate::error::{Input, ReconError};
use crate::filter::filter_loans;
use crate::join::join_accruals;
use crate::model::{ReconInput, ReconMeta, ReconResult, ReconSummary};

/// Run the reconciliation: filter, ARC exclusion, accrual aggregation, join,
/// AUM. Stops at the first failure; nothing partial is returned.
pub fn run(config: &PipelineConfig, input: ReconInput) -> Result<ReconResult, ReconError> {
    let ReconInput { loans, arc, ledger } = input;

    // ARC column is resolved before any row is touched
    let (arc_idx, arc_column) = match resolve_account_column(&arc, &config.arc.account_token) {
        ColumnResolution::Found { index, name } => {
            log::debug!("ARC account column: '{name}' (position {index})");
            (index, name)
        }
        ColumnResolution::NotFound => {
            return Err(ReconError::schema(
                Input::Arc,
                format!(
                    "no column name contains '{}'; cannot identify the account-number column",
                    config.arc.account_token
                ),
            ));
        }
    };

    let filtered = filter_loans(&loans, &config.loans);
    log::debug!(
        "filter: {} read, {} written off, {} inactive, {} kept",
        loans.len(),
        filtered.written_off,
        filtered.inactive,
        filtered.table.len()
    );
    if !filtered.missing_columns.is_empty() {
        log::warn!(
            "filter: allow-listed columns not in loan portfolio: {}",
            filtered.missing_columns.join(", ")
        );
    }

    let excluded = exclude_arc(filtered.table, &config.loans.account_column, &arc, arc_idx)?;
    log::debug!("arc: {} loans excluded, {} remain", excluded.excluded, excluded.table.len());

    let accruals = aggregate_accruals(&ledger, &config.ledger)?;
    log::debug!(
        "ledger: {} rows, {} accrual rows, {} accounts",
        accruals.ledger_rows,
        accruals.accrual_rows,
        accruals.totals.len()
    );

    let joined = join_accruals(
        excluded.table,
        &accruals.totals,
        &config.loans.account_column,
        &config.output.accrual_column,
    )?;
    log::debug!("join: {} of {} loans matched an accrual", joined.matched, joined.table.len());

    let total_accrual: f64 = joined
        .table
        .column_index(&config.output.accrual_column)
        .map(|idx| joined.table.column_values(idx).filter_map(|v| v.to_f64()).sum())
        .unwrap_or(0.0);

    let aum = derive_aum(joined.table, config)?;

    let summary = ReconSummary {
        loans_read: loans.len(),
        dropped_written_off: filtered.written_off,
        dropped_inactive: filtered.inactive,
        columns_projected: config.loans.allow_list.len() - filtered.missing_columns.len(),
        missing_columns: filtered.missing_columns,
        arc_column,
        arc_excluded: excluded.excluded,
        ledger_rows: accruals.ledger_rows,
        accrual_rows: accruals.accrual_rows,
        accrual_accounts: accruals.totals.len(),
        loans_with_accrual: joined.matched,
        output_rows: aum.table.len(),
        total_accrual,
        total_aum: aum.total_aum,
    };
    log::info!("reconciled: {}", summary.describe());

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            aum_mode: config.aum.mode,
        },
        summary,
        portfolio: aum.table,
    })
}
