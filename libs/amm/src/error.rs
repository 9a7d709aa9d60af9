//! Quoting failures raised by the invariant engine

use thiserror::Error;

/// Reasons a swap amount cannot be computed from a snapshot.
///
/// None of these are faults: the orchestrator turns every variant into
/// "no price available" for the affected amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("Swap amount must be positive")]
    ZeroAmount,

    #[error("Pool has no liquidity: {0}")]
    NoLiquidity(&'static str),

    #[error("Insufficient liquidity: requested {requested} exceeds available {available}")]
    InsufficientLiquidity { requested: String, available: String },

    #[error("Arithmetic domain error: {0}")]
    ArithmeticDomain(&'static str),

    #[error("Result does not fit in 256 bits")]
    Overflow,
}
