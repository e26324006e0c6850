//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3       | Universal        | File I/O (unreadable input, write fails) |
//! | 60-69   | recon            | Pipeline config and data errors          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use loanbook_recon::ReconError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// An input file cannot be read or parsed, or the output cannot be written.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Pipeline config failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// A required column could not be identified in an input.
pub const EXIT_RECON_SCHEMA: u8 = 61;

/// A cell that must be numeric is not.
pub const EXIT_RECON_VALUE: u8 = 62;

/// Any other pipeline failure.
pub const EXIT_RECON_RUNTIME: u8 = 63;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::Schema { .. } => EXIT_RECON_SCHEMA,
        ReconError::Value { .. } => EXIT_RECON_VALUE,
        ReconError::Pipeline(_) => EXIT_RECON_RUNTIME,
    }
}
