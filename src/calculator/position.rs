//! Leveraged position calculator: sizing, live/target/stop P&L, ROE, R:R.
//!
//! Every function here is pure. Degenerate inputs (zero entry, zero
//! margin, missing live price, zero divisors) map to defined zero outputs
//! instead of errors, so a front end can call `evaluate` on every input
//! change without guarding anything but `has_sufficient_input`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::models::{
    EvaluationStatus, PnlStatus, PositionResult, Sizing, SizingMode, TradeRequest, TradeSide,
};

use super::CalcError;

/// Calculator for leveraged position figures.
pub struct PositionCalculator;

impl PositionCalculator {
    /// Gating predicate: does the request carry enough input to be worth
    /// evaluating?
    ///
    /// Requires a positive entry price and a positive quantity or margin.
    /// With `require_live_price` the live price must be positive as well.
    pub fn has_sufficient_input(req: &TradeRequest, require_live_price: bool) -> bool {
        let sized = match req.sizing {
            SizingMode::ByQuantity(q) => q > Decimal::ZERO,
            SizingMode::ByMargin(m) => m > Decimal::ZERO,
        };

        req.entry_price > Decimal::ZERO
            && sized
            && (!require_live_price || req.live_price() > Decimal::ZERO)
    }

    /// Resolve quantity, required margin and position value.
    ///
    /// By quantity: value = entry * qty, margin = value / leverage.
    /// By margin: value = margin * leverage, qty = value / entry.
    pub fn resolve_sizing(req: &TradeRequest) -> Result<Sizing, CalcError> {
        let entry = req.entry_price;
        if entry <= Decimal::ZERO {
            return Err(CalcError::InsufficientInput("entry price must be positive"));
        }

        let leverage = Self::effective_leverage(req.leverage);

        match req.sizing {
            SizingMode::ByQuantity(quantity) => {
                if quantity <= Decimal::ZERO {
                    return Err(CalcError::InsufficientInput("quantity must be positive"));
                }

                let position_value = entry
                    .checked_mul(quantity)
                    .ok_or(CalcError::Overflow("computing position value"))?;
                let required_margin = position_value
                    .checked_div(leverage)
                    .ok_or(CalcError::Overflow("computing required margin"))?;

                Ok(Sizing {
                    quantity,
                    required_margin,
                    position_value,
                })
            }
            SizingMode::ByMargin(margin) => {
                if margin <= Decimal::ZERO {
                    return Err(CalcError::InsufficientInput("margin must be positive"));
                }

                let position_value = margin
                    .checked_mul(leverage)
                    .ok_or(CalcError::Overflow("computing position value"))?;
                let quantity = position_value
                    .checked_div(entry)
                    .ok_or(CalcError::Overflow("computing quantity"))?;

                // Tiny margin against a huge entry can round to nothing
                if quantity.is_zero() {
                    return Err(CalcError::InsufficientInput("margin too small for entry price"));
                }

                Ok(Sizing {
                    quantity,
                    required_margin: margin,
                    position_value,
                })
            }
        }
    }

    /// Side-relative P&L of `quantity` units opened at `entry` and marked
    /// at `price`.
    ///
    /// Returns exactly zero when any of entry, price or quantity is zero or
    /// negative: a non-positive price means "no live data", not "price
    /// crashed to nothing".
    pub fn signed_pnl(entry: Decimal, price: Decimal, quantity: Decimal, side: TradeSide) -> Decimal {
        if entry <= Decimal::ZERO || price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let diff = match side {
            TradeSide::Buy => price.checked_sub(entry),
            TradeSide::Sell => entry.checked_sub(price),
        };

        match diff.and_then(|d| d.checked_mul(quantity)) {
            Some(pnl) => pnl,
            None => {
                warn!(%entry, %price, %quantity, "P&L overflowed, reporting zero");
                Decimal::ZERO
            }
        }
    }

    /// Evaluate a trade request into a full position result.
    pub fn evaluate(req: &TradeRequest) -> PositionResult {
        let sizing = match Self::resolve_sizing(req) {
            Ok(sizing) => sizing,
            Err(e) => {
                debug!(symbol = %req.symbol, error = %e, "Sizing unresolved, returning empty result");
                return PositionResult::insufficient();
            }
        };

        let entry = req.entry_price;
        let quantity = sizing.quantity;

        let pnl_live = Self::signed_pnl(entry, req.live_price(), quantity, req.side);
        let pnl_at_take_profit = Self::distance_pnl(req.take_profit(), entry, quantity);
        let pnl_at_stop_loss = Self::distance_pnl(req.stop_loss(), entry, quantity);

        let roe_percent = Self::ratio(pnl_live, sizing.required_margin)
            .and_then(|r| r.checked_mul(dec!(100)))
            .unwrap_or(Decimal::ZERO);
        let risk_reward_ratio =
            Self::ratio(pnl_at_take_profit, pnl_at_stop_loss).unwrap_or(Decimal::ZERO);

        debug!(
            symbol = %req.symbol,
            side = %req.side,
            quantity = %quantity,
            pnl_live = %pnl_live,
            roe = %roe_percent,
            "Position evaluated"
        );

        PositionResult {
            quantity,
            position_value: sizing.position_value,
            required_margin: sizing.required_margin,
            pnl_live,
            pnl_at_take_profit,
            pnl_at_stop_loss,
            roe_percent,
            risk_reward_ratio,
            status: PnlStatus::from_pnl(pnl_live),
            evaluation: EvaluationStatus::Complete,
        }
    }

    /// Leverage actually applied; non-positive leverage means 1x.
    fn effective_leverage(leverage: Decimal) -> Decimal {
        if leverage > Decimal::ZERO {
            leverage
        } else {
            Decimal::ONE
        }
    }

    /// Unsigned P&L of moving from `entry` to `target`; zero if no target.
    ///
    /// Direction-agnostic: a take-profit reports the gain and a stop-loss
    /// the loss as magnitudes, regardless of trade side.
    fn distance_pnl(target: Decimal, entry: Decimal, quantity: Decimal) -> Decimal {
        if target <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        match target
            .checked_sub(entry)
            .and_then(|d| d.abs().checked_mul(quantity))
        {
            Some(pnl) => pnl,
            None => {
                warn!(%target, %entry, %quantity, "Target P&L overflowed, reporting zero");
                Decimal::ZERO
            }
        }
    }

    /// `numerator / denominator` for a strictly positive denominator.
    fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
        if denominator > Decimal::ZERO {
            numerator.checked_div(denominator)
        } else {
            None
        }
    }
}
