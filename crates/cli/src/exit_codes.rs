//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad values)   |
//! | 10-19   | backend          | Auth, lookup, and transport failures     |
//! | 20-29   | data             | Tab contents or input do not fit a table |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the mapping functions below

use smartspread_backend::BackendError;
use smartspread_engine::EngineError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (local I/O, output errors).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options, invalid values.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Backend (10-19)
// =============================================================================

/// No credentials saved, or the service rejected the token (401).
pub const EXIT_NOT_AUTH: u8 = 10;

/// Spreadsheet or tab does not exist (or is not shared with this account).
pub const EXIT_NOT_FOUND: u8 = 11;

/// Network failure, rate limiting, or 5xx after retries.
pub const EXIT_NETWORK: u8 = 12;

/// Service rejected the request (400/422).
pub const EXIT_VALIDATION: u8 = 13;

/// Any other HTTP error (e.g. 403 permission denied).
pub const EXIT_HTTP: u8 = 14;

/// Service response could not be understood.
pub const EXIT_PARSE: u8 = 15;

// =============================================================================
// Data (20-29)
// =============================================================================

/// Tab is empty or has no header row.
pub const EXIT_EMPTY_TAB: u8 = 20;

/// A row is wider than the header row.
pub const EXIT_SHAPE: u8 = 21;

/// Nothing to write: the table has no columns.
pub const EXIT_EMPTY_DATA: u8 = 22;

/// Named column does not exist.
pub const EXIT_COLUMN_NOT_FOUND: u8 = 23;

/// Input file is not valid CSV.
pub const EXIT_INPUT: u8 = 24;

/// Map a backend error to its exit code.
pub fn backend_exit_code(err: &BackendError) -> u8 {
    match err {
        BackendError::NotAuthenticated => EXIT_NOT_AUTH,
        BackendError::NotFound(_) => EXIT_NOT_FOUND,
        BackendError::Network(_) => EXIT_NETWORK,
        BackendError::Http(429, _) | BackendError::Http(500..=599, _) => EXIT_NETWORK,
        BackendError::Http(_, _) => EXIT_HTTP,
        BackendError::Validation(_) => EXIT_VALIDATION,
        BackendError::Parse(_) => EXIT_PARSE,
        BackendError::Io(_) => EXIT_ERROR,
    }
}

/// Map an engine error to its exit code.
pub fn engine_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::EmptyTab => EXIT_EMPTY_TAB,
        EngineError::Shape { .. } => EXIT_SHAPE,
        EngineError::EmptyData => EXIT_EMPTY_DATA,
        EngineError::ColumnNotFound(_) => EXIT_COLUMN_NOT_FOUND,
        EngineError::InvalidArgument(_) => EXIT_USAGE,
    }
}
