use serde::Serialize;

use crate::config::AumMode;
use crate::table::Table;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The three pre-loaded input tables.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    /// Loan portfolio extract, one row per loan.
    pub loans: Table,
    /// ARC reference: accounts transferred out of the book.
    pub arc: Table,
    /// LMS053 general-ledger extract.
    pub ledger: Table,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub loans_read: usize,
    pub dropped_written_off: usize,
    pub dropped_inactive: usize,
    pub columns_projected: usize,
    /// Allow-listed columns absent from the loan portfolio.
    pub missing_columns: Vec<String>,
    /// ARC column the exclusion matched on.
    pub arc_column: String,
    pub arc_excluded: usize,
    pub ledger_rows: usize,
    pub accrual_rows: usize,
    pub accrual_accounts: usize,
    pub loans_with_accrual: usize,
    pub output_rows: usize,
    pub total_accrual: f64,
    pub total_aum: f64,
}

impl ReconSummary {
    /// One-line human summary.
    pub fn describe(&self) -> String {
        format!(
            "{} loans read, {} written off, {} inactive, {} in ARC; \
             {} of {} accrual accounts matched; {} rows out, accrual {:.2}, AUM {:.2}",
            self.loans_read,
            self.dropped_written_off,
            self.dropped_inactive,
            self.arc_excluded,
            self.loans_with_accrual,
            self.accrual_accounts,
            self.output_rows,
            self.total_accrual,
            self.total_aum,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub aum_mode: AumMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    /// Reconciled loan book: allow-listed columns, then accrual, then AUM.
    #[serde(skip)]
    pub portfolio: Table,
}
