//! Trade request model: what the trader is asking the calculator about.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::CalcError;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }

    /// The side that profits from the opposite price move.
    #[cfg(test)]
    pub fn opposite(&self) -> Self {
        match self {
            TradeSide::Buy => TradeSide::Sell,
            TradeSide::Sell => TradeSide::Buy,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" => Ok(TradeSide::Buy),
            "sell" | "short" => Ok(TradeSide::Sell),
            _ => Err(CalcError::UnknownSide(s.to_string())),
        }
    }
}

/// How the size of the position is expressed.
///
/// Exactly one source of sizing is ever applied: either the trader states
/// the quantity, or states the margin and lets leverage derive the quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum SizingMode {
    /// Quantity in base units
    ByQuantity(Decimal),
    /// Margin in quote currency
    ByMargin(Decimal),
}

impl SizingMode {
    /// Build a sizing mode from two optional inputs, of which exactly one
    /// must be supplied.
    pub fn from_inputs(
        quantity: Option<Decimal>,
        margin: Option<Decimal>,
    ) -> Result<Self, CalcError> {
        match (quantity, margin) {
            (Some(q), None) => Ok(SizingMode::ByQuantity(q)),
            (None, Some(m)) => Ok(SizingMode::ByMargin(m)),
            (Some(_), Some(_)) => Err(CalcError::AmbiguousSizing),
            (None, None) => Err(CalcError::MissingSizing),
        }
    }
}

/// Inputs for a single calculation. Built fresh for every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Instrument identifier, carried for display only
    pub symbol: String,

    /// Trade direction
    pub side: TradeSide,

    /// Price at which the position was opened
    pub entry_price: Decimal,

    /// Latest market price; `None` and zero both mean "no live data"
    #[serde(default)]
    pub current_price: Option<Decimal>,

    /// Quantity or margin based sizing
    pub sizing: SizingMode,

    /// Leverage multiplier (values <= 0 are treated as 1x)
    pub leverage: Decimal,

    /// Optional take-profit exit price
    #[serde(default)]
    pub take_profit_price: Option<Decimal>,

    /// Optional stop-loss exit price
    #[serde(default)]
    pub stop_loss_price: Option<Decimal>,
}

impl TradeRequest {
    pub fn new(
        symbol: impl Into<String>,
        side: TradeSide,
        entry_price: Decimal,
        sizing: SizingMode,
        leverage: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            entry_price,
            current_price: None,
            sizing,
            leverage,
            take_profit_price: None,
            stop_loss_price: None,
        }
    }

    pub fn with_current_price(mut self, price: Decimal) -> Self {
        self.current_price = Some(price);
        self
    }

    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit_price = Some(price);
        self
    }

    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss_price = Some(price);
        self
    }

    /// Live price with "absent" collapsed to zero.
    pub fn live_price(&self) -> Decimal {
        self.current_price.unwrap_or(Decimal::ZERO)
    }

    pub fn take_profit(&self) -> Decimal {
        self.take_profit_price.unwrap_or(Decimal::ZERO)
    }

    pub fn stop_loss(&self) -> Decimal {
        self.stop_loss_price.unwrap_or(Decimal::ZERO)
    }
}
