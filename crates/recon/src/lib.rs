//! `loanbook-recon`: loan portfolio reconciliation pipeline.
//!
//! Pure engine crate: receives the loan portfolio, ARC reference, and LMS053
//! ledger as pre-loaded tables and returns the reconciled loan book with
//! accrual and AUM columns. No CLI or file IO.

pub mod aggregate;
pub mod arc;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod filter;
pub mod join;
pub mod model;
pub mod table;

pub use config::PipelineConfig;
pub use engine::run;
pub use error::{Input, ReconError};
pub use model::{ReconInput, ReconResult, ReconSummary};
pub use table::{Table, Value};
