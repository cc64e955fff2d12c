// ⚠️ Error Types - Boundary errors and per-row skip reasons
//
// The graph engine itself never surfaces these to a caller: `GraphAssembler::build`
// converts any `Error` into an empty snapshot plus a log entry. Loaders and binaries
// use them to report I/O and configuration problems.

use thiserror::Error;

/// Result type for donor-network operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error (bad file, unreadable headers)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invariant broken while assembling a snapshot
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single input row was dropped before entering the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("name is empty")]
    MissingName,

    #[error("amount is missing")]
    MissingAmount,

    #[error("amount is not numeric: {0:?}")]
    InvalidAmount(String),

    #[error("row could not be read: {0}")]
    Malformed(String),
}
