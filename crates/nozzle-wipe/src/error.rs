//! Error types for the wipe engine.

use thiserror::Error;

/// Errors that can occur while planning a wipe.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WipeError {
    /// Settings produce an unusable wipe geometry.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The engine was used before `initialize` succeeded.
    #[error("wipe engine is not initialized")]
    NotInitialized,

    /// A segment with no length was asked to do something only a real segment can.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Result type for wipe operations.
pub type Result<T> = std::result::Result<T, WipeError>;
