use crate::domain::notification::Severity;
use crate::domain::ports::{BalanceSource, Notifier};
use crate::infrastructure::persistence::{ProfitEntry, ProfitHistoryStore};
use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Records the wallet balance once per run and reports the change since the
/// previous record.
pub struct ProfitTracker {
    balances: Arc<dyn BalanceSource>,
    history: Arc<ProfitHistoryStore>,
    notifier: Arc<dyn Notifier>,
    token_symbol: String,
}

fn signed(value: Decimal) -> String {
    let rounded = value.round_dp(4);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{:.4}", rounded)
    } else {
        format!("+{:.4}", rounded.abs())
    }
}

impl ProfitTracker {
    pub fn new(
        balances: Arc<dyn BalanceSource>,
        history: Arc<ProfitHistoryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            balances,
            history,
            notifier,
            token_symbol: "OCEAN".to_string(),
        }
    }

    /// `Ok(None)` when the balance could not be fetched (already notified).
    pub async fn track(&self, wallet: &str) -> Result<Option<ProfitEntry>> {
        let balance = match self.balances.balance(wallet).await {
            Ok(balance) => balance,
            Err(e) => {
                self.notifier
                    .notify(
                        Severity::Critical,
                        &format!("Profit tracker: error fetching balance: {:#}", e),
                    )
                    .await;
                return Ok(None);
            }
        };

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let entry = self
            .history
            .record(date, balance)
            .context("Failed to update profit history")?;

        info!(
            "ProfitTracker: balance {} {} ({} since last record)",
            entry.balance, self.token_symbol, entry.profit
        );
        let message = format!(
            "Daily Profit Summary\nDate: {}\nCurrent Balance: {:.4} {}\nChange (24h): {} {}",
            entry.date,
            entry.balance.round_dp(4),
            self.token_symbol,
            signed(entry.profit),
            self.token_symbol
        );
        self.notifier.notify(Severity::Info, &message).await;

        Ok(Some(entry))
    }
}
