//! Position result model: everything derived from a single trade request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of the live P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PnlStatus {
    Profit,
    Loss,
    Neutral,
}

impl PnlStatus {
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            PnlStatus::Profit
        } else if pnl < Decimal::ZERO {
            PnlStatus::Loss
        } else {
            PnlStatus::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PnlStatus::Profit => "PROFIT",
            PnlStatus::Loss => "LOSS",
            PnlStatus::Neutral => "NEUTRAL",
        }
    }
}

/// Whether the calculator had enough input to produce figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Complete,
    InsufficientInput,
}

/// Resolved size of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sizing {
    /// Position size in base units
    pub quantity: Decimal,

    /// Capital committed at the given leverage
    pub required_margin: Decimal,

    /// Notional value of the position
    pub position_value: Decimal,
}

/// Output of a single evaluation. No identity, discarded after display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionResult {
    /// Resolved position size
    pub quantity: Decimal,

    /// Notional value (entry price * quantity)
    pub position_value: Decimal,

    /// Capital at risk given leverage
    pub required_margin: Decimal,

    /// Signed P&L at the live price
    pub pnl_live: Decimal,

    /// Profit magnitude if the take-profit price is reached
    pub pnl_at_take_profit: Decimal,

    /// Loss magnitude if the stop-loss price is reached
    pub pnl_at_stop_loss: Decimal,

    /// Live P&L as a percentage of required margin
    pub roe_percent: Decimal,

    /// Take-profit gain over stop-loss loss
    pub risk_reward_ratio: Decimal,

    /// Sign of the live P&L
    pub status: PnlStatus,

    /// Whether figures were computed at all
    pub evaluation: EvaluationStatus,
}

impl PositionResult {
    /// The all-zero result reported when sizing could not be resolved.
    pub fn insufficient() -> Self {
        Self {
            quantity: Decimal::ZERO,
            position_value: Decimal::ZERO,
            required_margin: Decimal::ZERO,
            pnl_live: Decimal::ZERO,
            pnl_at_take_profit: Decimal::ZERO,
            pnl_at_stop_loss: Decimal::ZERO,
            roe_percent: Decimal::ZERO,
            risk_reward_ratio: Decimal::ZERO,
            status: PnlStatus::Neutral,
            evaluation: EvaluationStatus::InsufficientInput,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.evaluation == EvaluationStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_from_pnl() {
        assert_eq!(PnlStatus::from_pnl(dec!(0.01)), PnlStatus::Profit);
        assert_eq!(PnlStatus::from_pnl(dec!(-3)), PnlStatus::Loss);
        assert_eq!(PnlStatus::from_pnl(Decimal::ZERO), PnlStatus::Neutral);
    }

    #[test]
    fn test_insufficient_default() {
        let result = PositionResult::insufficient();
        assert!(!result.is_complete());
        assert_eq!(result.quantity, Decimal::ZERO);
        assert_eq!(result.roe_percent, Decimal::ZERO);
        assert_eq!(result.status, PnlStatus::Neutral);
    }
}
