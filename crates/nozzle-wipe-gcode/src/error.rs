//! Error types for G-code handling.

use nozzle_wipe::WipeError;
use thiserror::Error;

/// Errors from reading G-code or planning wipes for it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// A word did not start with a letter.
    #[error("line {line}: invalid word `{word}`")]
    InvalidWord {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        word: String,
    },

    /// A word's value was not a number.
    #[error("line {line}: invalid number in `{word}`")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// Offending word.
        word: String,
    },

    /// Wipe planning failed.
    #[error(transparent)]
    Wipe(#[from] WipeError),
}

/// Result type for G-code operations.
pub type Result<T> = std::result::Result<T, GcodeError>;
