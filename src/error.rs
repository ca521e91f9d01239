//! Error handling module
//!
//! Defines the error taxonomy for the gear optimizer.

use thiserror::Error;

/// Errors an optimization run or its component helpers can raise.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// Optimization was requested before the engine's stores were initialized.
    #[error("worker not ready: {0}")]
    WorkerNotReady(String),

    /// A filter helper was called with a slot outside the eleven equipment slots.
    #[error("invalid slot: {0}")]
    InvalidSlot(String),

    /// Constraints were internally inconsistent (e.g. `enforce_skill_requirements`
    /// set without `player_skills`).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external DPS calculator returned an error; the optimization aborts.
    #[error("dps calculator failed: {0}")]
    CalculatorFailure(#[from] anyhow::Error),
}

/// Result type alias for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;
