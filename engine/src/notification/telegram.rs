// Telegram Bot API channel
use super::format::{self, Markup};
use super::Notifier;
use crate::config::settings::TelegramConfig;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::models::{CurrencyAnalysis, PriceQuote};
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    api_base: String,
    bot_token: String,
    chat_id: String,
    http: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(EngineError::ConfigError(
                "telegram requires both bot_token and chat_id".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(TelegramNotifier {
            api_base: API_BASE.to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            http,
        })
    }

    /// Points the client at a different Bot API host (self-hosted server or test double).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let reply: ApiReply = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if !reply.ok {
            let detail = reply.description.unwrap_or_else(|| "unknown error".to_string());
            tracing::error!(chat_id = %self.chat_id, error = %detail, "Telegram rejected message");
            return Err(EngineError::NotificationError(format!("telegram: {}", detail)));
        }
        tracing::info!(chat_id = %self.chat_id, "Telegram message sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_price_alert(&self, symbol: &str, quote: &PriceQuote) -> Result<()> {
        self.send_message(&format::price_alert(symbol, quote, Markup::Html, Utc::now()))
            .await
    }

    async fn send_report(&self, analysis: &CurrencyAnalysis) -> Result<()> {
        self.send_message(&format::analysis_report(analysis, Markup::Html, Utc::now()))
            .await
    }

    async fn send_error(&self, error: &str, context: &str) -> Result<()> {
        self.send_message(&format::error_alert(error, context, Markup::Html, Utc::now()))
            .await
    }

    async fn test_connection(&self) -> Result<()> {
        self.send_message(&format::connection_test(self.name(), Markup::Html, Utc::now()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: &str, chat: &str) -> TelegramConfig {
        TelegramConfig {
            enabled: true,
            bot_token: token.to_string(),
            chat_id: chat.to_string(),
        }
    }

    #[test]
    fn test_incomplete_config_rejected() {
        assert!(matches!(
            TelegramNotifier::new(&config("", "42")),
            Err(EngineError::ConfigError(_))
        ));
        assert!(TelegramNotifier::new(&config("123:abc", "")).is_err());
    }

    #[test]
    fn test_endpoint() {
        let notifier = TelegramNotifier::new(&config("123:abc", "42"))
            .unwrap()
            .with_api_base("http://localhost:8081/");
        assert_eq!(notifier.endpoint(), "http://localhost:8081/bot123:abc/sendMessage");
    }

    #[test]
    fn test_payload_shape() {
        let payload = SendMessage {
            chat_id: "42",
            text: "hi",
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["disable_web_page_preview"], true);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let notifier = TelegramNotifier::new(&config("123:abc", "42"))
            .unwrap()
            .with_api_base("http://127.0.0.1:9");
        assert!(notifier.test_connection().await.is_err());
    }
}
