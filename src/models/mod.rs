//! Data models for trade requests and position results.

mod position;
mod trade;

pub use position::{EvaluationStatus, PnlStatus, PositionResult, Sizing};
pub use trade::{SizingMode, TradeRequest, TradeSide};
