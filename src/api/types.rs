//! Wire types for the market-data chart API and the chat-completions API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response from /v8/finance/chart/{symbol}.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub indicators: Option<ChartIndicators>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<Decimal>,
    #[serde(default)]
    pub regular_market_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteSeries {
    #[serde(default)]
    pub close: Vec<Option<Decimal>>,
}

impl ChartResult {
    /// Last non-null close in the returned series.
    pub fn last_close(&self) -> Option<Decimal> {
        self.indicators
            .as_ref()?
            .quote
            .first()?
            .close
            .iter()
            .rev()
            .find_map(|c| *c)
    }
}

/// Chat message for /chat/completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for /chat/completions.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from /chat/completions.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}
