use super::log_notifier::log_notification;
use crate::domain::notification::Severity;
use crate::domain::ports::Notifier;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram bot delivery. Failures are logged and otherwise ignored.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>, timeout: Duration) -> Self {
        Self::with_api_base(TELEGRAM_API, bot_token, chat_id, timeout)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: HttpClientFactory::create_plain_client(timeout),
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, severity: Severity, message: &str) {
        log_notification(severity, message);

        let payload = json!({
            "chat_id": self.chat_id,
            "text": severity.render(message),
        });

        match self.client.post(self.send_url()).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!("TelegramNotifier: delivery rejected with HTTP {}", response.status()),
            // The token is part of the URL; keep it out of the logs.
            Err(e) => warn!("TelegramNotifier: delivery failed: {}", e.without_url()),
        }
    }
}
