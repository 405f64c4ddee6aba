//! Text dashboard for a position result.

use rust_decimal::Decimal;

use crate::models::{PositionResult, TradeSide};

/// Display symbol for a currency code, falling back to the ticker's
/// exchange suffix when no code is known.
pub fn currency_symbol(code: Option<&str>, symbol: &str) -> String {
    match code.map(|c| c.trim().to_uppercase()) {
        Some(c) if c == "INR" => "₹".to_string(),
        Some(c) if c == "USD" => "$".to_string(),
        Some(c) if c == "EUR" => "€".to_string(),
        Some(c) if c == "GBP" => "£".to_string(),
        Some(c) if c == "JPY" => "¥".to_string(),
        Some(c) if !c.is_empty() => format!("{} ", c),
        _ => {
            let symbol = symbol.to_uppercase();
            if symbol.ends_with(".NS") || symbol.ends_with(".BO") {
                "₹".to_string()
            } else {
                "$".to_string()
            }
        }
    }
}

/// Money with two decimals and thousands separators, e.g. `-$1,234.50`.
pub fn format_money(value: Decimal, currency: &str) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    format!("{}{}{}.{}", sign, currency, group_thousands(int_part), frac_part)
}

/// A fractional offset as a percentage, e.g. `0.02` as `2.00%`.
pub fn format_offset(fraction: Decimal) -> String {
    match fraction.checked_mul(Decimal::ONE_HUNDRED) {
        Some(pct) => format!("{}%", pct),
        None => format!("{} (fraction)", fraction),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Everything the dashboard shows for one evaluation.
#[derive(Debug, Clone)]
pub struct Dashboard<'a> {
    pub symbol: &'a str,
    pub side: TradeSide,
    pub currency: String,
    pub live_price: Decimal,
    pub result: &'a PositionResult,
}

impl std::fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = self.result;
        let cur = self.currency.as_str();

        writeln!(f, "\n{:=^50}", " TRADING DASHBOARD ")?;
        writeln!(f, "Symbol:           {} ({})", self.symbol, self.side)?;

        if self.live_price > Decimal::ZERO {
            writeln!(f, "Live Price:       {}", format_money(self.live_price, cur))?;
        } else {
            writeln!(f, "Live Price:       unavailable")?;
        }

        if !r.is_complete() {
            writeln!(f)?;
            writeln!(
                f,
                "Not enough input: enter a positive entry price and a quantity or margin."
            )?;
            writeln!(f, "{:=^50}", "")?;
            return Ok(());
        }

        writeln!(f, "Status:           {}", r.status.as_str())?;
        writeln!(f)?;
        writeln!(f, "{:<18}{}", "Required Margin", format_money(r.required_margin, cur))?;
        writeln!(f, "{:<18}{}", "Position Value", format_money(r.position_value, cur))?;
        writeln!(f, "{:<18}{:.4}", "Quantity", r.quantity.round_dp(4))?;
        writeln!(f, "{:<18}{}", "Live PnL", format_money(r.pnl_live, cur))?;
        writeln!(f, "{:<18}{:.2}%", "ROE %", r.roe_percent.round_dp(2))?;
        writeln!(f, "{:<18}{}", "TP Profit", format_money(r.pnl_at_take_profit, cur))?;
        writeln!(f, "{:<18}{}", "SL Loss", format_money(r.pnl_at_stop_loss, cur))?;
        writeln!(f, "{:<18}1 : {:.2}", "R:R Ratio", r.risk_reward_ratio.round_dp(2))?;
        writeln!(f, "{:=^50}", "")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::PositionCalculator;
    use crate::models::{SizingMode, TradeRequest};
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_symbol() {
        assert_eq!(currency_symbol(Some("INR"), "TCS.NS"), "₹");
        assert_eq!(currency_symbol(Some("usd"), "BTC-USD"), "$");
        assert_eq!(currency_symbol(Some("CHF"), "NESN.SW"), "CHF ");
        assert_eq!(currency_symbol(None, "reliance.ns"), "₹");
        assert_eq!(currency_symbol(None, "AAPL"), "$");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(1234567.891), "$"), "$1,234,567.89");
        assert_eq!(format_money(dec!(-20), "₹"), "-₹20.00");
        assert_eq!(format_money(dec!(999.5), "$"), "$999.50");
        assert_eq!(format_money(dec!(-0.001), "$"), "$0.00");
        assert_eq!(format_money(Decimal::ZERO, "$"), "$0.00");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(dec!(0.02)), "2.00%");
        assert_eq!(format_offset(dec!(0.5)), "50.0%");
        assert_eq!(format_offset(Decimal::MAX), format!("{} (fraction)", Decimal::MAX));
    }

    #[test]
    fn test_dashboard_rows() {
        let req = TradeRequest::new(
            "BTC-USD",
            TradeSide::Buy,
            dec!(3000),
            SizingMode::ByMargin(dec!(100)),
            dec!(50),
        )
        .with_current_price(dec!(3030))
        .with_take_profit(dec!(3060))
        .with_stop_loss(dec!(2970));
        let result = PositionCalculator::evaluate(&req);

        let text = Dashboard {
            symbol: &req.symbol,
            side: req.side,
            currency: "$".to_string(),
            live_price: dec!(3030),
            result: &result,
        }
        .to_string();

        assert!(text.contains("Status:           PROFIT"));
        assert!(text.contains("Quantity          1.6667"));
        assert!(text.contains("Live PnL          $50.00"));
        assert!(text.contains("ROE %             50.00%"));
        assert!(text.contains("R:R Ratio         1 : 2.00"));
    }

    #[test]
    fn test_dashboard_insufficient_input() {
        let result = PositionResult::insufficient();
        let text = Dashboard {
            symbol: "ACME",
            side: TradeSide::Sell,
            currency: "$".to_string(),
            live_price: Decimal::ZERO,
            result: &result,
        }
        .to_string();

        assert!(text.contains("Live Price:       unavailable"));
        assert!(text.contains("Not enough input"));
        assert!(!text.contains("ROE"));
    }
}
