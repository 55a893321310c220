//! Error types for quasigroup construction and normalization.

use crate::LoopState;

/// Errors raised while building or transforming a quasigroup.
#[derive(Debug, thiserror::Error)]
pub enum QuasigroupError {
    /// The text source is not a rectangular grid of integers.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    /// The table breaks the Latin-square law.
    #[error("not a quasigroup: {0}")]
    InvalidQuasigroup(String),

    /// A normalization step was invoked out of order.
    #[error("{step} requires {required} state, found {found}")]
    StepPrecondition {
        step: &'static str,
        required: LoopState,
        found: LoopState,
    },

    /// The unit element passed to a normalization step is not an element.
    #[error("{step}: unit {unit} is not below the order {order}")]
    UnitOutOfRange {
        step: &'static str,
        unit: usize,
        order: usize,
    },

    /// The unit column has no fixed point besides the unit itself.
    #[error("no row x != {unit} with x * {unit} = x")]
    NoReduction { unit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for quasigroup operations
pub type Result<T> = std::result::Result<T, QuasigroupError>;
