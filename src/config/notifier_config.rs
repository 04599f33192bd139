//! Notification channel configuration parsing from environment variables.

use super::optional_string;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct NotifierEnvConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub timeout: Duration,
}

impl NotifierEnvConfig {
    pub fn from_env() -> Self {
        Self {
            // TELEGRAM_TOKEN is the older name some deployments still use
            telegram_bot_token: optional_string("TELEGRAM_BOT_TOKEN")
                .or_else(|| optional_string("TELEGRAM_TOKEN")),
            telegram_chat_id: optional_string("TELEGRAM_CHAT_ID"),
            timeout: Duration::from_secs(10),
        }
    }

    /// Both halves of the Telegram credentials are present.
    pub fn telegram_enabled(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_needs_token_and_chat() {
        let mut config = NotifierEnvConfig {
            telegram_bot_token: Some("token".to_string()),
            ..NotifierEnvConfig::default()
        };
        assert!(!config.telegram_enabled());

        config.telegram_chat_id = Some("42".to_string());
        assert!(config.telegram_enabled());
    }
}
