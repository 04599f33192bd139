//! Binance spot ticker used as the price input for predictions.

use crate::domain::feed::exchange_symbol;
use crate::domain::ports::PriceSource;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PriceTicker {
    symbol: String,
    price: String,
}

pub struct BinancePriceSource {
    client: ClientWithMiddleware,
    base_url: String,
}

impl BinancePriceSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            base_url: base_url.into(),
        }
    }

    fn ticker_url(&self, feed: &str) -> String {
        let url = format!("{}/api/v3/ticker/price", self.base_url.trim_end_matches('/'));
        build_url_with_query(&url, &[("symbol", exchange_symbol(feed))])
    }
}

#[async_trait]
impl PriceSource for BinancePriceSource {
    async fn spot_price(&self, feed: &str) -> Result<Decimal> {
        let url = self.ticker_url(feed);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} price from Binance", feed))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance ticker API error ({}): {}", status, error_text);
        }

        let ticker: PriceTicker = response
            .json()
            .await
            .context("Failed to parse Binance ticker")?;

        let price = Decimal::from_str_exact(&ticker.price)
            .with_context(|| format!("Invalid price '{}' for {}", ticker.price, ticker.symbol))?;
        debug!("BinancePriceSource: {} = {}", ticker.symbol, price);
        Ok(price)
    }
}
