//! Error taxonomy for the position calculator.
//!
//! None of these ever escape `PositionCalculator::evaluate`: they are
//! absorbed into the zeroed result. `resolve_sizing` and input parsing
//! surface them so callers can explain why nothing was computed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("Insufficient input: {0}")]
    InsufficientInput(&'static str),

    #[error("Arithmetic overflow while {0}")]
    Overflow(&'static str),

    #[error("Both quantity and margin supplied; choose one sizing mode")]
    AmbiguousSizing,

    #[error("Neither quantity nor margin supplied")]
    MissingSizing,

    #[error("Unknown trade side: {0} (expected BUY or SELL)")]
    UnknownSide(String),
}
