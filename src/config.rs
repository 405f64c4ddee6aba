//! Application configuration: calculator defaults and collaborator endpoints.

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for the calculator front end and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Symbol used when none is given
    pub default_symbol: String,

    /// Margin used when neither quantity nor margin is given
    pub default_margin: Decimal,

    /// Leverage used when none is given
    pub default_leverage: Decimal,

    /// Default take-profit distance above the live price (0.02 = 2%)
    pub take_profit_offset: Decimal,

    /// Default stop-loss distance below the live price (0.02 = 2%)
    pub stop_loss_offset: Decimal,

    /// Base URL of the market-data chart API
    pub price_api_base: String,

    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,

    /// Total time spent retrying a throttled price request, in seconds
    pub retry_budget_secs: u64,

    /// Base URL of the chat-completions API
    pub commentary_api_base: String,

    /// Model used for trend commentary
    pub commentary_model: String,

    /// Timeout for commentary requests in seconds
    pub commentary_timeout_secs: u64,

    /// API key for commentary; commentary is disabled without one
    #[serde(skip)]
    pub commentary_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_symbol: "BTC-USD".to_string(),
            default_margin: dec!(100),
            default_leverage: dec!(50),
            take_profit_offset: dec!(0.02), // TP at +2%
            stop_loss_offset: dec!(0.02),   // SL at -2%
            price_api_base: "https://query1.finance.yahoo.com".to_string(),
            http_timeout_secs: 10,
            retry_budget_secs: 5,
            commentary_api_base: "https://api.openai.com/v1".to_string(),
            commentary_model: "gpt-4o-mini".to_string(),
            commentary_timeout_secs: 30,
            commentary_api_key: None,
        }
    }
}

impl AppConfig {
    /// Load defaults overridden by environment variables:
    /// - LEVCALC_DEFAULT_SYMBOL
    /// - LEVCALC_DEFAULT_MARGIN
    /// - LEVCALC_DEFAULT_LEVERAGE
    /// - LEVCALC_TP_OFFSET
    /// - LEVCALC_SL_OFFSET
    /// - LEVCALC_PRICE_API_BASE
    /// - LEVCALC_HTTP_TIMEOUT_SECS
    /// - LEVCALC_RETRY_BUDGET_SECS
    /// - COMMENTARY_API_KEY
    /// - COMMENTARY_API_BASE
    /// - COMMENTARY_MODEL
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reading variables through `get`.
    pub fn from_vars<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(symbol) = var("LEVCALC_DEFAULT_SYMBOL") {
            config.default_symbol = symbol.to_uppercase();
        }
        if let Some(v) = var("LEVCALC_DEFAULT_MARGIN") {
            config.default_margin = parse_var("LEVCALC_DEFAULT_MARGIN", &v)?;
        }
        if let Some(v) = var("LEVCALC_DEFAULT_LEVERAGE") {
            config.default_leverage = parse_var("LEVCALC_DEFAULT_LEVERAGE", &v)?;
        }
        if let Some(v) = var("LEVCALC_TP_OFFSET") {
            config.take_profit_offset = parse_var("LEVCALC_TP_OFFSET", &v)?;
        }
        if let Some(v) = var("LEVCALC_SL_OFFSET") {
            config.stop_loss_offset = parse_var("LEVCALC_SL_OFFSET", &v)?;
        }
        if let Some(url) = var("LEVCALC_PRICE_API_BASE") {
            config.price_api_base = url;
        }
        if let Some(v) = var("LEVCALC_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = parse_var("LEVCALC_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("LEVCALC_RETRY_BUDGET_SECS") {
            config.retry_budget_secs = parse_var("LEVCALC_RETRY_BUDGET_SECS", &v)?;
        }
        if let Some(url) = var("COMMENTARY_API_BASE") {
            config.commentary_api_base = url;
        }
        if let Some(model) = var("COMMENTARY_MODEL") {
            config.commentary_model = model;
        }
        config.commentary_api_key = var("COMMENTARY_API_KEY");

        Ok(config)
    }

    /// Default take-profit price for a live price; `None` on overflow.
    pub fn default_take_profit(&self, live_price: Decimal) -> Option<Decimal> {
        Decimal::ONE
            .checked_add(self.take_profit_offset)
            .and_then(|factor| live_price.checked_mul(factor))
    }

    /// Default stop-loss price for a live price; `None` on overflow.
    pub fn default_stop_loss(&self, live_price: Decimal) -> Option<Decimal> {
        Decimal::ONE
            .checked_sub(self.stop_loss_offset)
            .and_then(|factor| live_price.checked_mul(factor))
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("Invalid {}: {:?}", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_vars(|_| None).unwrap();
        assert_eq!(config.default_symbol, "BTC-USD");
        assert_eq!(config.default_margin, dec!(100));
        assert_eq!(config.default_leverage, dec!(50));
        assert!(config.commentary_api_key.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env = vars(&[
            ("LEVCALC_DEFAULT_SYMBOL", "reliance.ns"),
            ("LEVCALC_DEFAULT_LEVERAGE", "20"),
            ("LEVCALC_TP_OFFSET", "0.05"),
            ("COMMENTARY_API_KEY", "sk-test"),
            ("COMMENTARY_MODEL", "  "),
        ]);
        let config = AppConfig::from_vars(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.default_symbol, "RELIANCE.NS");
        assert_eq!(config.default_leverage, dec!(20));
        assert_eq!(config.take_profit_offset, dec!(0.05));
        assert_eq!(config.commentary_api_key.as_deref(), Some("sk-test"));
        // Blank values leave the default in place
        assert_eq!(config.commentary_model, "gpt-4o-mini");
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let env = vars(&[("LEVCALC_DEFAULT_MARGIN", "lots")]);
        let err = AppConfig::from_vars(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("LEVCALC_DEFAULT_MARGIN"));
    }

    #[test]
    fn test_default_targets() {
        let config = AppConfig::default();
        assert_eq!(config.default_take_profit(dec!(100)), Some(dec!(102)));
        assert_eq!(config.default_stop_loss(dec!(100)), Some(dec!(98)));
    }

    #[test]
    fn test_default_targets_overflow_to_none() {
        let config = AppConfig::default();
        assert_eq!(config.default_take_profit(Decimal::MAX), None);

        let config = AppConfig {
            stop_loss_offset: Decimal::MIN,
            ..Default::default()
        };
        assert_eq!(config.default_stop_loss(dec!(100)), None);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = AppConfig {
            commentary_api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
