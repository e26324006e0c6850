use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Loan portfolio columns retained after filtering, in output order.
pub const DEFAULT_ALLOW_LIST: [&str; 45] = [
    "loan_account_number",
    "customer_name",
    "cibil",
    "product_code",
    "product_name",
    "interest_rate",
    "original_tenure",
    "ltv",
    "login_date",
    "sourcing_channel",
    "dsa_name",
    "dealer_code",
    "dealer_name",
    "collateral_type",
    "model",
    "model_year",
    "registration_number",
    "chasis_no",
    "engine_no",
    "sanction_date",
    "sanctioned_amount",
    "interest_start_date",
    "repayment_start_date",
    "maturity_date",
    "installment_amount",
    "disbursal_date",
    "disbursal_amount",
    "pending_amount",
    "disbursal_status",
    "principal_outstanding",
    "total_excess_money",
    "dpd",
    "dpd_wise",
    "asset_classification",
    "credit_manager_id",
    "credit_manager_name",
    "sourcing_rm_id",
    "sourcing_rm_name",
    "branch_id",
    "branch_code",
    "branch_name",
    "state",
    "repayment_mode",
    "nach_status",
    "loan_status",
];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Pipeline settings. Every field has a default, so an empty TOML document
/// yields the standard LMS053/ARC reconciliation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: String,
    pub loans: LoanConfig,
    pub arc: ArcConfig,
    pub ledger: LedgerConfig,
    pub output: OutputConfig,
    pub aum: AumConfig,
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoanConfig {
    pub account_column: String,
    pub writeoff_column: String,
    pub status_column: String,
    /// Write-off flag value (case-insensitive) that drops a loan.
    pub writeoff_value: String,
    /// Status value (case-insensitive) a loan must carry to be kept.
    pub active_value: String,
    pub allow_list: Vec<String>,
}

impl Default for LoanConfig {
    fn default() -> Self {
        Self {
            account_column: "loan_account_number".into(),
            writeoff_column: "accounting_writeoff".into(),
            status_column: "loan_status".into(),
            writeoff_value: "yes".into(),
            active_value: "active".into(),
            allow_list: DEFAULT_ALLOW_LIST.iter().map(|c| c.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ARC
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArcConfig {
    /// Substring (case-insensitive) identifying the ARC account-number column.
    pub account_token: String,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            account_token: "loan_account_number".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger (LMS053)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub desc_column: String,
    pub account_column: String,
    pub debit_column: String,
    /// Ledger description (case-insensitive) selecting accrual rows.
    pub accrual_desc: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            desc_column: "Gl Desc".into(),
            account_column: "Loan Account Number".into(),
            debit_column: "Debit Amount".into(),
            accrual_desc: "ACCRUAL INCOME".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub accrual_column: String,
    pub aum_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            accrual_column: "Accrual_Amount".into(),
            aum_column: "AUM".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AUM
// ---------------------------------------------------------------------------

/// How the four AUM inputs are located in the joined table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AumMode {
    /// Look each input up by column name.
    #[default]
    Named,
    /// Legacy layout: fixed zero-based positions in the joined column list.
    Positional,
}

impl std::fmt::Display for AumMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named => write!(f, "named"),
            Self::Positional => write!(f, "positional"),
        }
    }
}

/// Column positions used by `AumMode::Positional`.
pub mod positions {
    /// Column "AB": subtracted from principal.
    pub const PENDING: usize = 27;
    /// Column "AD": principal base.
    pub const PRINCIPAL: usize = 29;
    /// Column "AE": subtracted from principal.
    pub const EXCESS: usize = 30;
    /// Column "AT": added after the clamp.
    pub const ACCRUAL: usize = 45;
    /// The joined table must be at least this wide.
    pub const MIN_COLUMNS: usize = ACCRUAL + 1;
}

/// `AUM = max(principal - (pending + excess), 0) + accrual`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AumConfig {
    pub mode: AumMode,
    pub principal: String,
    pub pending: String,
    pub excess: String,
    /// Defaults to `output.accrual_column`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<String>,
}

impl Default for AumConfig {
    fn default() -> Self {
        Self {
            mode: AumMode::Named,
            principal: "principal_outstanding".into(),
            pending: "pending_amount".into(),
            excess: "total_excess_money".into(),
            accrual: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    /// Name of the accrual column the AUM formula reads.
    pub fn aum_accrual_column(&self) -> &str {
        self.aum.accrual.as_deref().unwrap_or(&self.output.accrual_column)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let required = [
            ("loans.account_column", &self.loans.account_column),
            ("loans.writeoff_column", &self.loans.writeoff_column),
            ("loans.status_column", &self.loans.status_column),
            ("arc.account_token", &self.arc.account_token),
            ("ledger.desc_column", &self.ledger.desc_column),
            ("ledger.account_column", &self.ledger.account_column),
            ("ledger.debit_column", &self.ledger.debit_column),
            ("ledger.accrual_desc", &self.ledger.accrual_desc),
            ("output.accrual_column", &self.output.accrual_column),
            ("output.aum_column", &self.output.aum_column),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{key} must not be empty")));
            }
        }

        if self.loans.allow_list.is_empty() {
            return Err(ReconError::ConfigValidation(
                "loans.allow_list must name at least one column".into(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.loans.allow_list {
            if !seen.insert(column.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "loans.allow_list lists '{column}' more than once"
                )));
            }
        }

        // ARC exclusion and the accrual join both key on the account column
        if !seen.contains(self.loans.account_column.as_str()) {
            return Err(ReconError::ConfigValidation(format!(
                "loans.allow_list must include the account column '{}'",
                self.loans.account_column
            )));
        }

        for output in [&self.output.accrual_column, &self.output.aum_column] {
            if seen.contains(output.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "output column '{output}' collides with an allow-listed loan column"
                )));
            }
        }
        if self.output.accrual_column == self.output.aum_column {
            return Err(ReconError::ConfigValidation(
                "output.accrual_column and output.aum_column must differ".into(),
            ));
        }

        if self.aum.mode == AumMode::Named {
            let named = [
                ("aum.principal", self.aum.principal.as_str()),
                ("aum.pending", self.aum.pending.as_str()),
                ("aum.excess", self.aum.excess.as_str()),
                ("aum.accrual", self.aum_accrual_column()),
            ];
            for (key, value) in named {
                if value.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!("{key} must not be empty")));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
