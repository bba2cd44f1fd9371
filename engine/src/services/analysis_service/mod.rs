// engine/src/services/analysis_service/mod.rs
// AnalysisService ties the market-data provider, the indicator engine, the
// signal reducer and the notification manager together. Each operation lives
// in its own sibling module.

use crate::config::AppConfig;
use crate::data::{self, ApiStatus, MarketDataProvider};
use crate::error::Result;
use crate::indicators::IndicatorEngine;
use crate::notification::{Delivery, NotificationManager};
use crate::signals::SignalReducer;
use shared::models::{CoinInfo, CoinListing, CurrencyAnalysis, PriceQuote};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

pub mod analyze_currency;
pub mod market_info;
pub mod monitor;
pub mod report;

pub use monitor::CycleReport;

/// Pause between consecutive currencies so public APIs are not hammered.
const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

pub struct AnalysisService {
    config: AppConfig,
    provider: Arc<dyn MarketDataProvider>,
    engine: IndicatorEngine,
    reducer: SignalReducer,
    notifications: NotificationManager,
    last_prices: Mutex<HashMap<String, f64>>,
    pause: Duration,
}

impl AnalysisService {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn MarketDataProvider>,
        notifications: NotificationManager,
    ) -> Result<Self> {
        let engine = IndicatorEngine::new(config.analysis.indicators.indicator_parameters())?;
        Ok(AnalysisService {
            config,
            provider,
            engine,
            reducer: SignalReducer::new(),
            notifications,
            last_prices: Mutex::new(HashMap::new()),
            pause: DEFAULT_PAUSE,
        })
    }

    /// Provider and notification channels as selected by `config`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let provider = data::provider_from_config(&config.api)?;
        let notifications = NotificationManager::from_config(&config.notification);
        Self::new(config, provider, notifications)
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    pub async fn analyze_currency(&self, symbol: &str) -> Result<CurrencyAnalysis> {
        tracing::info!(symbol, provider = self.provider.name(), "Analysing currency");
        analyze_currency::handle_analyze_currency(self, symbol).await
    }

    /// Every enabled currency in configuration order; failures are kept per symbol.
    pub async fn analyze_all(&self) -> Vec<(String, Result<CurrencyAnalysis>)> {
        let symbols: Vec<String> = self
            .config
            .enabled_currencies()
            .into_iter()
            .map(|c| c.symbol.clone())
            .collect();
        tracing::info!(count = symbols.len(), "Analysing all enabled currencies");

        let mut results = Vec::with_capacity(symbols.len());
        for (i, symbol) in symbols.into_iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            let outcome = self.analyze_currency(&symbol).await;
            if let Err(e) = &outcome {
                tracing::error!(symbol = %symbol, error = %e, "Analysis failed");
            }
            results.push((symbol, outcome));
        }
        results
    }

    pub async fn send_analysis_report(&self, analysis: &CurrencyAnalysis) -> Delivery {
        let delivery = self.notifications.send_analysis_report(analysis).await;
        match &delivery {
            Delivery::Skipped => tracing::debug!(symbol = %analysis.symbol, "Report skipped (cooldown)"),
            Delivery::Sent(results) => tracing::info!(
                symbol = %analysis.symbol,
                channels = results.len(),
                delivered = delivery.any_delivered(),
                "Analysis report dispatched"
            ),
        }
        delivery
    }

    /// Runs monitoring cycles until `shutdown` carries `true` or its sender is dropped.
    pub async fn monitor(&self, shutdown: watch::Receiver<bool>) {
        monitor::run(self, shutdown).await
    }

    pub async fn monitor_cycle(&self) -> CycleReport {
        monitor::run_cycle(self).await
    }

    pub async fn provider_status(&self) -> (String, ApiStatus) {
        (
            self.provider.name().to_string(),
            self.provider.check_status().await,
        )
    }

    pub async fn coin_info(&self, symbol: &str) -> Result<CoinInfo> {
        market_info::handle_coin_info(self, symbol).await
    }

    /// Current quote per enabled currency, fetched in one provider call.
    pub async fn prices(&self) -> Result<Vec<(String, PriceQuote)>> {
        market_info::handle_prices(self).await
    }

    pub async fn supported_coins(&self) -> Result<Vec<CoinListing>> {
        self.provider.get_supported_coins().await
    }

    pub async fn test_notifications(&self) -> Vec<(String, bool)> {
        self.notifications.test_all().await
    }

    pub fn render_analysis(analysis: &CurrencyAnalysis) -> String {
        report::render_analysis(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CsvMarketData;
    use crate::error::EngineError;
    use crate::notification::{ConsoleNotifier, NotificationChannel};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    pub(super) fn write_history(dir: &Path, coin_id: &str, closes: &[f64]) {
        let mut body = String::from("timestamp,price,high,low,volume\n");
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for (i, close) in closes.iter().enumerate() {
            let day = start + chrono::Duration::days(i as i64);
            body.push_str(&format!(
                "{},{},{},{},{}\n",
                day.format("%Y-%m-%d"),
                close,
                close + 1.0,
                close - 1.0,
                1000.0 + i as f64
            ));
        }
        std::fs::write(dir.join(format!("{}.csv", coin_id)), body).unwrap();
    }

    pub(super) fn test_service(dir: &TempDir) -> AnalysisService {
        let mut config = AppConfig::default();
        config.analysis.lookback_days = 365;
        config.monitoring.check_interval = 60;
        let provider = Arc::new(CsvMarketData::new(dir.path().to_path_buf()));
        let notifications = NotificationManager::new(
            vec![NotificationChannel::Console(ConsoleNotifier::new())],
            Duration::from_secs(300),
        );
        AnalysisService::new(config, provider, notifications)
            .unwrap()
            .with_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_analyze_currency_from_csv() {
        let dir = tempdir().unwrap();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        write_history(dir.path(), "bitcoin", &closes);
        let service = test_service(&dir);

        let analysis = service.analyze_currency("btc").await.unwrap();
        assert_eq!(analysis.symbol, "BTC");
        assert_eq!(analysis.coin_id, "bitcoin");
        assert_eq!(analysis.quote.price, 159.0);
        assert_eq!(analysis.technical.data_points, 60);
        assert_eq!(analysis.technical.current_price, 159.0);
        assert!(analysis.technical.indicators.contains("MACD"));
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_config_error() {
        let dir = tempdir().unwrap();
        let service = test_service(&dir);
        let err = service.analyze_currency("XRP").await.unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_analyze_all_keeps_per_symbol_failures() {
        let dir = tempdir().unwrap();
        write_history(dir.path(), "bitcoin", &[100.0, 101.0, 102.0]);
        let service = test_service(&dir);

        let results = service.analyze_all().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "BTC");
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, "ETH");
        assert!(matches!(results[1].1, Err(EngineError::MarketDataError(_))));
    }

    #[tokio::test]
    async fn test_report_is_cooldown_gated() {
        let dir = tempdir().unwrap();
        write_history(dir.path(), "bitcoin", &[100.0, 101.0, 102.0]);
        let service = test_service(&dir);
        let analysis = service.analyze_currency("BTC").await.unwrap();

        assert!(service.send_analysis_report(&analysis).await.any_delivered());
        assert_eq!(service.send_analysis_report(&analysis).await, Delivery::Skipped);
    }

    #[tokio::test]
    async fn test_provider_status_and_notifier_test() {
        let dir = tempdir().unwrap();
        let service = test_service(&dir);
        assert_eq!(service.provider_status().await, ("csv".to_string(), ApiStatus::Online));
        assert_eq!(service.test_notifications().await, vec![("console".to_string(), true)]);
    }
}
