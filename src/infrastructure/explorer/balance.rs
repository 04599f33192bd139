//! Wallet balance lookups against the Sapphire explorer API.

use crate::domain::ports::BalanceSource;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, join_path};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;

/// Native token precision.
pub const TOKEN_DECIMALS: u32 = 18;

/// Convert a wei amount (JSON string or number) to whole tokens.
pub fn wei_to_tokens(raw: &Value) -> Result<Decimal> {
    let wei: i128 = match raw {
        Value::String(s) => s
            .trim()
            .parse()
            .with_context(|| format!("balance '{}' is not an integer", s))?,
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or_else(|| anyhow!("balance {} is not an integer", n))?,
        Value::Null => 0,
        other => bail!("unexpected balance value {}", other),
    };

    Decimal::try_from_i128_with_scale(wei, TOKEN_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|e| anyhow!("balance {} out of range: {}", wei, e))
}

pub struct ExplorerBalanceSource {
    client: ClientWithMiddleware,
    accounts_url: String,
}

impl ExplorerBalanceSource {
    pub fn new(accounts_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            accounts_url: accounts_url.into(),
        }
    }
}

#[async_trait]
impl BalanceSource for ExplorerBalanceSource {
    async fn balance(&self, wallet: &str) -> Result<Decimal> {
        let url = join_path(&self.accounts_url, wallet);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch wallet balance")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Explorer API error ({}): {}", status, error_text);
        }

        let account: Value = response
            .json()
            .await
            .context("Failed to parse explorer response")?;
        wei_to_tokens(account.get("balance").unwrap_or(&Value::Null))
    }
}
