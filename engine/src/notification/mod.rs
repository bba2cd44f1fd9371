// Notification channels and the cooldown-gated manager that fans out to them
pub mod console;
pub mod format;
pub mod telegram;

pub use console::ConsoleNotifier;
pub use telegram::TelegramNotifier;

use crate::config::settings::NotificationConfig;
use crate::error::Result;
use async_trait::async_trait;
use shared::models::{CurrencyAnalysis, PriceQuote};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A sink for alerts and reports. Every operation reports failure through its `Result`.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send_price_alert(&self, symbol: &str, quote: &PriceQuote) -> Result<()>;

    async fn send_report(&self, analysis: &CurrencyAnalysis) -> Result<()>;

    async fn send_error(&self, error: &str, context: &str) -> Result<()>;

    async fn test_connection(&self) -> Result<()>;
}

/// Closed set of channels the manager can drive.
pub enum NotificationChannel {
    Telegram(TelegramNotifier),
    Console(ConsoleNotifier),
}

#[async_trait]
impl Notifier for NotificationChannel {
    fn name(&self) -> &str {
        match self {
            NotificationChannel::Telegram(n) => n.name(),
            NotificationChannel::Console(n) => n.name(),
        }
    }

    async fn send_price_alert(&self, symbol: &str, quote: &PriceQuote) -> Result<()> {
        match self {
            NotificationChannel::Telegram(n) => n.send_price_alert(symbol, quote).await,
            NotificationChannel::Console(n) => n.send_price_alert(symbol, quote).await,
        }
    }

    async fn send_report(&self, analysis: &CurrencyAnalysis) -> Result<()> {
        match self {
            NotificationChannel::Telegram(n) => n.send_report(analysis).await,
            NotificationChannel::Console(n) => n.send_report(analysis).await,
        }
    }

    async fn send_error(&self, error: &str, context: &str) -> Result<()> {
        match self {
            NotificationChannel::Telegram(n) => n.send_error(error, context).await,
            NotificationChannel::Console(n) => n.send_error(error, context).await,
        }
    }

    async fn test_connection(&self) -> Result<()> {
        match self {
            NotificationChannel::Telegram(n) => n.test_connection().await,
            NotificationChannel::Console(n) => n.test_connection().await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    PriceAlert,
    AnalysisReport,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::PriceAlert => "price_alert",
            NotificationKind::AnalysisReport => "analysis_report",
        }
    }
}

/// Outcome of a fan-out: either suppressed by the cooldown, or one entry per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Skipped,
    Sent(Vec<(String, bool)>),
}

impl Delivery {
    pub fn any_delivered(&self) -> bool {
        matches!(self, Delivery::Sent(results) if results.iter().any(|(_, ok)| *ok))
    }
}

pub struct NotificationManager {
    channels: Vec<NotificationChannel>,
    cooldown: Duration,
    last_sent: Mutex<HashMap<(String, NotificationKind), Instant>>,
}

impl NotificationManager {
    pub fn new(channels: Vec<NotificationChannel>, cooldown: Duration) -> Self {
        NotificationManager {
            channels,
            cooldown,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Builds the enabled channels. An incomplete Telegram section is logged and skipped.
    pub fn from_config(config: &NotificationConfig) -> Self {
        let mut channels = Vec::new();
        if config.enabled {
            if config.telegram.enabled {
                match TelegramNotifier::new(&config.telegram) {
                    Ok(n) => channels.push(NotificationChannel::Telegram(n)),
                    Err(e) => tracing::warn!(error = %e, "Telegram notifier skipped"),
                }
            }
            if config.console.enabled {
                channels.push(NotificationChannel::Console(ConsoleNotifier::new()));
            }
        }
        tracing::info!(channels = channels.len(), "Notification manager initialised");
        Self::new(channels, Duration::from_secs(config.cooldown))
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Returns true and records the send time when `(symbol, kind)` is outside its cooldown.
    pub async fn should_send(&self, symbol: &str, kind: NotificationKind) -> bool {
        let now = Instant::now();
        let mut last_sent = self.last_sent.lock().await;
        let key = (symbol.to_string(), kind);
        if let Some(prev) = last_sent.get(&key) {
            let elapsed = now.duration_since(*prev);
            if elapsed < self.cooldown {
                tracing::debug!(
                    symbol,
                    kind = kind.as_str(),
                    remaining_secs = (self.cooldown - elapsed).as_secs(),
                    "Notification in cooldown"
                );
                return false;
            }
        }
        last_sent.insert(key, now);
        true
    }

    pub async fn send_price_alert(&self, symbol: &str, quote: &PriceQuote) -> Delivery {
        if !self.should_send(symbol, NotificationKind::PriceAlert).await {
            return Delivery::Skipped;
        }
        let mut results = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let outcome = channel.send_price_alert(symbol, quote).await;
            results.push(Self::record(channel.name(), NotificationKind::PriceAlert.as_str(), outcome));
        }
        Delivery::Sent(results)
    }

    pub async fn send_analysis_report(&self, analysis: &CurrencyAnalysis) -> Delivery {
        if !self
            .should_send(&analysis.symbol, NotificationKind::AnalysisReport)
            .await
        {
            return Delivery::Skipped;
        }
        let mut results = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let outcome = channel.send_report(analysis).await;
            results.push(Self::record(channel.name(), NotificationKind::AnalysisReport.as_str(), outcome));
        }
        Delivery::Sent(results)
    }

    /// Error alerts are never throttled.
    pub async fn send_error_alert(&self, error: &str, context: &str) -> Vec<(String, bool)> {
        let mut results = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let outcome = channel.send_error(error, context).await;
            results.push(Self::record(channel.name(), "error_alert", outcome));
        }
        results
    }

    pub async fn test_all(&self) -> Vec<(String, bool)> {
        let mut results = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let outcome = channel.test_connection().await;
            results.push(Self::record(channel.name(), "connection_test", outcome));
        }
        results
    }

    fn record(channel: &str, kind: &str, outcome: Result<()>) -> (String, bool) {
        match outcome {
            Ok(()) => (channel.to_string(), true),
            Err(e) => {
                tracing::error!(channel, kind, error = %e, "Notification failed");
                (channel.to_string(), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn console_manager(cooldown: Duration) -> NotificationManager {
        NotificationManager::new(
            vec![NotificationChannel::Console(ConsoleNotifier::new())],
            cooldown,
        )
    }

    #[tokio::test]
    async fn test_cooldown_per_symbol_and_kind() {
        let manager = console_manager(Duration::from_secs(300));
        assert!(manager.should_send("BTC", NotificationKind::PriceAlert).await);
        assert!(!manager.should_send("BTC", NotificationKind::PriceAlert).await);
        assert!(manager.should_send("BTC", NotificationKind::AnalysisReport).await);
        assert!(manager.should_send("ETH", NotificationKind::PriceAlert).await);
    }

    #[tokio::test]
    async fn test_zero_cooldown_never_skips() {
        let manager = console_manager(Duration::ZERO);
        assert!(manager.should_send("BTC", NotificationKind::PriceAlert).await);
        assert!(manager.should_send("BTC", NotificationKind::PriceAlert).await);
    }

    #[tokio::test]
    async fn test_price_alert_fan_out_then_skip() {
        let manager = console_manager(Duration::from_secs(300));
        let quote = PriceQuote {
            price: 100.0,
            change_24h: 6.0,
            ..Default::default()
        };
        let first = manager.send_price_alert("BTC", &quote).await;
        assert_eq!(first, Delivery::Sent(vec![("console".to_string(), true)]));
        assert!(first.any_delivered());
        assert_eq!(manager.send_price_alert("BTC", &quote).await, Delivery::Skipped);
    }

    #[tokio::test]
    async fn test_error_alert_ignores_cooldown() {
        let manager = console_manager(Duration::from_secs(300));
        assert_eq!(manager.send_error_alert("boom", "ctx").await.len(), 1);
        assert_eq!(manager.send_error_alert("boom", "ctx").await.len(), 1);
    }

    #[tokio::test]
    async fn test_from_config_skips_incomplete_telegram() {
        let mut config = AppConfig::default().notification;
        config.enabled = true;
        config.telegram.enabled = true;
        config.telegram.bot_token.clear();
        config.console.enabled = true;
        let manager = NotificationManager::from_config(&config);
        assert_eq!(manager.channel_names(), vec!["console"]);
        assert_eq!(manager.test_all().await, vec![("console".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_disabled_config_has_no_channels() {
        let mut config = AppConfig::default().notification;
        config.enabled = false;
        let manager = NotificationManager::from_config(&config);
        assert!(manager.is_empty());
        assert!(manager.test_all().await.is_empty());
    }
}
