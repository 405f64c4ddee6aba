//! Live price lookup with symbol-candidate fallback.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use backoff::ExponentialBackoffBuilder;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

use super::types::ChartResponse;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) levcalc";

/// A resolved live price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Symbol that actually resolved (may differ from what the user typed)
    pub symbol: String,

    /// Latest price in `currency`
    pub price: Decimal,

    /// ISO currency code reported by the provider
    pub currency: Option<String>,

    /// Provider timestamp of the price, or fetch time if none
    pub fetched_at: DateTime<Utc>,
}

/// Source of live prices.
pub trait PriceFeed {
    fn quote(&self, symbol: &str) -> impl Future<Output = Result<Quote>>;
}

/// Ticker spellings to try for a user-entered symbol, in order.
///
/// A bare name is tried as an NSE listing, then as a crypto pair against
/// USD, then as typed. Symbols already qualified with an exchange suffix,
/// pair, or index/currency marker are only tried as typed.
pub fn symbol_candidates(raw: &str) -> Vec<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Vec::new();
    }

    if symbol.contains(['.', '-', '=', '^']) {
        return vec![symbol];
    }

    vec![
        format!("{}.NS", symbol),
        format!("{}-USD", symbol),
        symbol,
    ]
}

/// Try each candidate in order and return the first positive quote.
///
/// `None` means no candidate resolved; callers treat that exactly like a
/// zero live price.
pub async fn lookup<F: PriceFeed>(feed: &F, candidates: &[String]) -> Option<Quote> {
    for candidate in candidates {
        match feed.quote(candidate).await {
            Ok(quote) if quote.price > Decimal::ZERO => {
                info!(symbol = %quote.symbol, price = %quote.price, "Resolved live price");
                return Some(quote);
            }
            Ok(quote) => {
                debug!(symbol = %candidate, price = %quote.price, "Non-positive price, trying next candidate");
            }
            Err(e) => {
                debug!(symbol = %candidate, error = %e, "Quote failed, trying next candidate");
            }
        }
    }

    warn!(candidates = ?candidates, "No live price found for any candidate");
    None
}

/// Client for the Yahoo Finance chart API (read-only).
pub struct YahooClient {
    client: Client,
    base_url: String,
    retry_budget: Duration,
}

impl YahooClient {
    /// Create a client from application config.
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_base_url(
            config.price_api_base.clone(),
            Duration::from_secs(config.http_timeout_secs),
            Duration::from_secs(config.retry_budget_secs),
        )
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: String, timeout: Duration, retry_budget: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_budget,
        })
    }

    async fn fetch_chart(&self, symbol: &str) -> Result<ChartResponse> {
        let url = format!(
            "{}/v8/finance/chart/{}?range=1d&interval=1d",
            self.base_url, symbol
        );

        debug!(url = %url, "Fetching chart");

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(self.retry_budget))
            .build();

        let client = &self.client;
        let url = url.as_str();

        // Connection errors, 429 and 5xx are worth retrying; other statuses are final
        let response = backoff::future::retry(policy, || async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(anyhow::Error::from(e)))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                return Err(backoff::Error::transient(anyhow!(
                    "Chart request throttled or failed: {}",
                    status
                )));
            }

            Ok::<_, backoff::Error<anyhow::Error>>(response)
        })
        .await
        .with_context(|| format!("Failed to fetch chart for {}", symbol))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chart request failed: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse chart response")
    }
}

impl PriceFeed for YahooClient {
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let chart = self.fetch_chart(symbol).await?;
        quote_from_chart(symbol, chart)
    }
}

/// Extract a quote from a chart response.
///
/// Prefers the regular-market price and falls back to the last close.
pub fn quote_from_chart(requested: &str, chart: ChartResponse) -> Result<Quote> {
    if let Some(err) = chart.chart.error {
        anyhow::bail!("Chart error for {}: {} - {}", requested, err.code, err.description);
    }

    let result = chart
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("Empty chart result for {}", requested))?;

    let price = result
        .meta
        .regular_market_price
        .filter(|p| *p > Decimal::ZERO)
        .or_else(|| result.last_close())
        .ok_or_else(|| anyhow!("No price in chart for {}", requested))?;

    let fetched_at = result
        .meta
        .regular_market_time
        .and_then(|t| Utc.timestamp_opt(t, 0).single())
        .unwrap_or_else(Utc::now);

    let symbol = if result.meta.symbol.is_empty() {
        requested.to_string()
    } else {
        result.meta.symbol
    };

    Ok(Quote {
        symbol,
        price,
        currency: result.meta.currency,
        fetched_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct StaticFeed {
        prices: HashMap<String, Decimal>,
    }

    impl StaticFeed {
        fn new(entries: &[(&str, Decimal)]) -> Self {
            Self {
                prices: entries.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            }
        }
    }

    impl PriceFeed for StaticFeed {
        async fn quote(&self, symbol: &str) -> Result<Quote> {
            let price = self
                .prices
                .get(symbol)
                .copied()
                .ok_or_else(|| anyhow!("unknown symbol {}", symbol))?;

            Ok(Quote {
                symbol: symbol.to_string(),
                price,
                currency: Some("USD".to_string()),
                fetched_at: Utc::now(),
            })
        }
    }

    #[test]
    fn test_candidates_for_bare_name() {
        assert_eq!(
            symbol_candidates(" reliance "),
            vec!["RELIANCE.NS", "RELIANCE-USD", "RELIANCE"]
        );
    }

    #[test]
    fn test_candidates_for_qualified_symbols() {
        assert_eq!(symbol_candidates("btc-usd"), vec!["BTC-USD"]);
        assert_eq!(symbol_candidates("TCS.NS"), vec!["TCS.NS"]);
        assert_eq!(symbol_candidates("^nsei"), vec!["^NSEI"]);
        assert!(symbol_candidates("   ").is_empty());
    }

    #[test]
    fn test_lookup_falls_through_candidates() {
        let feed = StaticFeed::new(&[("BTC-USD", dec!(64000.5)), ("BTC", dec!(1))]);
        let quote = tokio_test::block_on(lookup(&feed, &symbol_candidates("btc"))).unwrap();

        assert_eq!(quote.symbol, "BTC-USD");
        assert_eq!(quote.price, dec!(64000.5));
    }

    #[test]
    fn test_lookup_skips_zero_prices() {
        let feed = StaticFeed::new(&[("ACME.NS", Decimal::ZERO), ("ACME", dec!(12))]);
        let quote = tokio_test::block_on(lookup(&feed, &symbol_candidates("acme"))).unwrap();

        assert_eq!(quote.symbol, "ACME");
    }

    #[test]
    fn test_lookup_not_found() {
        let feed = StaticFeed::new(&[]);
        assert!(tokio_test::block_on(lookup(&feed, &symbol_candidates("nothing"))).is_none());
    }

    #[test]
    fn test_quote_from_chart_prefers_market_price() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "RELIANCE.NS",
                        "currency": "INR",
                        "regularMarketPrice": 2931.15,
                        "regularMarketTime": 1760000000
                    },
                    "indicators": { "quote": [{ "close": [2920.0, null] }] }
                }],
                "error": null
            }
        }"#;
        let chart: ChartResponse = serde_json::from_str(body).unwrap();
        let quote = quote_from_chart("RELIANCE.NS", chart).unwrap();

        assert_eq!(quote.price, dec!(2931.15));
        assert_eq!(quote.currency.as_deref(), Some("INR"));
        assert_eq!(quote.fetched_at.timestamp(), 1760000000);
    }

    #[test]
    fn test_quote_from_chart_falls_back_to_close() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": { "symbol": "ETH-USD", "currency": "USD" },
                    "indicators": { "quote": [{ "close": [3001.5, 3010.25, null] }] }
                }]
            }
        }"#;
        let chart: ChartResponse = serde_json::from_str(body).unwrap();
        let quote = quote_from_chart("ETH-USD", chart).unwrap();

        assert_eq!(quote.price, dec!(3010.25));
    }

    #[test]
    fn test_quote_from_chart_error() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }"#;
        let chart: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(quote_from_chart("NOPE", chart).is_err());
    }
}
