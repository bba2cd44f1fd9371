// Console channel: plain-text messages through the tracing subscriber
use super::format::{self, Markup};
use super::Notifier;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use shared::models::{CurrencyAnalysis, PriceQuote};

#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        ConsoleNotifier
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_price_alert(&self, symbol: &str, quote: &PriceQuote) -> Result<()> {
        let body = format::price_alert(symbol, quote, Markup::Plain, Utc::now());
        tracing::info!(target: "notification", symbol, "\n{}", body);
        Ok(())
    }

    async fn send_report(&self, analysis: &CurrencyAnalysis) -> Result<()> {
        let body = format::analysis_report(analysis, Markup::Plain, Utc::now());
        tracing::info!(target: "notification", symbol = %analysis.symbol, "\n{}", body);
        Ok(())
    }

    async fn send_error(&self, error: &str, context: &str) -> Result<()> {
        let body = format::error_alert(error, context, Markup::Plain, Utc::now());
        tracing::warn!(target: "notification", "\n{}", body);
        Ok(())
    }

    async fn test_connection(&self) -> Result<()> {
        let body = format::connection_test(self.name(), Markup::Plain, Utc::now());
        tracing::info!(target: "notification", "\n{}", body);
        Ok(())
    }
}
