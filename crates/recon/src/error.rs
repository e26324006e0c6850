use thiserror::Error;

/// Which input table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Loans,
    Arc,
    Ledger,
    /// The joined portfolio table (AUM derivation).
    Portfolio,
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loans => write!(f, "loan portfolio"),
            Self::Arc => write!(f, "ARC file"),
            Self::Ledger => write!(f, "LMS053 ledger"),
            Self::Portfolio => write!(f, "portfolio"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty allow-list, duplicate column, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A required column cannot be identified in an input table.
    #[error("{input}: {message}")]
    Schema { input: Input, message: String },
    /// A cell that must be numeric is not. `row` is the sheet row (header is row 1).
    #[error("{input}, row {row}: column '{column}' is not numeric: '{value}'")]
    Value {
        input: Input,
        row: usize,
        column: String,
        value: String,
    },
    /// CSV decoding and other unexpected failures.
    #[error("pipeline failure: {0}")]
    Pipeline(String),
}

impl ReconError {
    pub fn schema(input: Input, message: impl Into<String>) -> Self {
        Self::Schema { input, message: message.into() }
    }

    pub fn missing_column(input: Input, column: &str) -> Self {
        Self::schema(input, format!("missing column '{column}'"))
    }
}
