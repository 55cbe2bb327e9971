use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::alert::AlertSink;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram Bot API notifier. A no-op unless both the bot token and chat id
/// are configured.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    enabled: bool,
    http: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        let bot_token = bot_token.filter(|s| !s.is_empty());
        let chat_id = chat_id.filter(|s| !s.is_empty());
        let enabled = bot_token.is_some() && chat_id.is_some();
        if !enabled {
            debug!("Telegram alerts disabled (missing bot token or chat id)");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            bot_token: bot_token.unwrap_or_default(),
            chat_id: chat_id.unwrap_or_default(),
            enabled,
            http,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn send(&self, text: &str) {
        if !self.enabled {
            return;
        }

        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API, self.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };

        match self.http.post(&url).json(&request).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Telegram alert sent");
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!("Telegram API error: {} - {}", status, body);
            }
            Err(e) => {
                error!("Failed to send Telegram alert: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_credentials() {
        assert!(!TelegramNotifier::new(None, None).is_enabled());
        assert!(!TelegramNotifier::new(Some("token".to_string()), None).is_enabled());
        assert!(!TelegramNotifier::new(None, Some("chat".to_string())).is_enabled());
        assert!(!TelegramNotifier::new(Some(String::new()), Some("chat".to_string())).is_enabled());
    }

    #[test]
    fn test_enabled_with_credentials() {
        let notifier =
            TelegramNotifier::new(Some("token".to_string()), Some("chat".to_string()));
        assert!(notifier.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_send_is_a_noop() {
        // Must return without attempting any network call
        TelegramNotifier::new(None, None).send("hello").await;
    }
}
