//! Position math: sizing, P&L, ROE and risk:reward.

mod error;
mod position;

pub use error::CalcError;
pub use position::PositionCalculator;
