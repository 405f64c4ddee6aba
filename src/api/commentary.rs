//! Free-text market trend commentary from a chat-completions model.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::AppConfig;

use super::types::{ChatMessage, ChatRequest, ChatResponse};

const SYSTEM_PROMPT: &str =
    "You are a concise market analyst. Answer in plain text without markdown.";

/// Source of trend commentary for a symbol.
pub trait CommentaryProvider {
    fn commentary(
        &self,
        symbol: &str,
        price: Decimal,
        currency: &str,
    ) -> impl Future<Output = Result<String>>;
}

/// Prompt asking for a short trend read on `symbol` at `price`.
pub fn trend_prompt(symbol: &str, price: Decimal, currency: &str) -> String {
    let price_text = if price > Decimal::ZERO {
        format!("currently trading at {}{:.2}", currency, price.round_dp(2))
    } else {
        "with no live price available".to_string()
    };

    format!(
        "Give a short trend outlook (3-4 sentences) for {} {}. \
         Cover short-term momentum, key support and resistance levels, and overall sentiment. \
         End with a one-line reminder that this is not financial advice.",
        symbol, price_text
    )
}

/// Client for an OpenAI-compatible /chat/completions endpoint.
pub struct CommentaryClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CommentaryClient {
    /// Build from config. Returns `None` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.commentary_api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.commentary_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Some(Self {
            client,
            base_url: config.commentary_api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.commentary_model.clone(),
        }))
    }
}

impl CommentaryProvider for CommentaryClient {
    async fn commentary(&self, symbol: &str, price: Decimal, currency: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: trend_prompt(symbol, price, currency),
                },
            ],
            max_tokens: Some(300),
            temperature: Some(0.4),
        };

        debug!(url = %url, model = %self.model, symbol = %symbol, "Requesting commentary");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to request commentary")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Commentary request failed: {} - {}", status, body);
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("Failed to parse commentary response")?;

        first_reply(body)
    }
}

/// Text of the first choice, trimmed.
fn first_reply(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Commentary response had no content"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trend_prompt_mentions_price() {
        let prompt = trend_prompt("BTC-USD", dec!(64000.456), "$");
        assert!(prompt.contains("BTC-USD"));
        assert!(prompt.contains("$64000.46"));

        let prompt = trend_prompt("ACME", Decimal::ZERO, "$");
        assert!(prompt.contains("no live price"));
    }

    #[test]
    fn test_first_reply() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Bullish above 63k.  "}}]}"#,
        )
        .unwrap();
        assert_eq!(first_reply(body).unwrap(), "Bullish above 63k.");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_reply(empty).is_err());
    }

    #[test]
    fn test_disabled_without_key() {
        let config = AppConfig::default();
        assert!(CommentaryClient::from_config(&config).unwrap().is_none());
    }
}
