// Periodic monitoring: price-move alerts plus per-currency analysis reports
use super::analyze_currency::analyze_with_quote;
use super::AnalysisService;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub analyzed: usize,
    pub alerts: usize,
    pub failures: usize,
}

pub async fn run(service: &AnalysisService, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(service.config.monitoring.check_interval.max(1));
    tracing::info!(
        check_interval_secs = interval.as_secs(),
        alert_threshold = service.config.monitoring.alert_threshold,
        "Monitoring started"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }
        let report = run_cycle(service).await;
        tracing::debug!(
            analyzed = report.analyzed,
            alerts = report.alerts,
            failures = report.failures,
            "Monitoring cycle complete, sleeping {}s",
            interval.as_secs()
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("Monitoring stopped");
}

pub async fn run_cycle(service: &AnalysisService) -> CycleReport {
    let mut report = CycleReport::default();
    let currencies: Vec<_> = service
        .config
        .enabled_currencies()
        .into_iter()
        .cloned()
        .collect();
    let threshold = service.config.monitoring.alert_threshold;

    for (i, currency) in currencies.iter().enumerate() {
        if i > 0 && !service.pause.is_zero() {
            tokio::time::sleep(service.pause).await;
        }

        let quote = match service.provider.get_price(&currency.coin_id).await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::error!(symbol = %currency.symbol, error = %e, "Price check failed");
                service
                    .notifications
                    .send_error_alert(&e.to_string(), &format!("price check for {}", currency.symbol))
                    .await;
                report.failures += 1;
                continue;
            }
        };

        if let Some(change) = record_price(service, &currency.symbol, quote.price).await {
            if change >= threshold {
                tracing::info!(symbol = %currency.symbol, change_pct = change, "Price move above threshold");
                if service
                    .notifications
                    .send_price_alert(&currency.symbol, &quote)
                    .await
                    .any_delivered()
                {
                    report.alerts += 1;
                }
            }
        }

        match analyze_with_quote(service, currency, quote).await {
            Ok(analysis) => {
                service.send_analysis_report(&analysis).await;
                report.analyzed += 1;
            }
            Err(e) => {
                tracing::error!(symbol = %currency.symbol, error = %e, "Analysis failed");
                service
                    .notifications
                    .send_error_alert(&e.to_string(), &format!("analysis of {}", currency.symbol))
                    .await;
                report.failures += 1;
            }
        }
    }
    report
}

/// Stores `price` and returns the absolute percent move from the previous check, if any.
async fn record_price(service: &AnalysisService, symbol: &str, price: f64) -> Option<f64> {
    let mut last_prices = service.last_prices.lock().await;
    let previous = last_prices.insert(symbol.to_string(), price)?;
    (previous > 0.0 && price > 0.0).then(|| ((price - previous) / previous).abs() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis_service::tests::{test_service, write_history};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_cycle_alerts_on_price_move() {
        let dir = tempdir().unwrap();
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        write_history(dir.path(), "bitcoin", &closes);
        write_history(dir.path(), "ethereum", &closes);
        let service = test_service(&dir);

        let first = run_cycle(&service).await;
        assert_eq!(first, CycleReport { analyzed: 2, alerts: 0, failures: 0 });

        // Last close jumps from 139 to 160, roughly 15%.
        let mut moved = closes.clone();
        moved.push(160.0);
        write_history(dir.path(), "bitcoin", &moved);
        let second = run_cycle(&service).await;
        assert_eq!(second.alerts, 1);
        assert_eq!(second.analyzed, 2);
    }

    #[tokio::test]
    async fn test_cycle_counts_failures() {
        let dir = tempdir().unwrap();
        write_history(dir.path(), "bitcoin", &[100.0, 101.0]);
        let service = test_service(&dir);

        let report = run_cycle(&service).await;
        assert_eq!(report, CycleReport { analyzed: 1, alerts: 0, failures: 1 });
    }

    #[tokio::test]
    async fn test_record_price_change() {
        let dir = tempdir().unwrap();
        let service = test_service(&dir);
        assert_eq!(record_price(&service, "BTC", 100.0).await, None);
        let change = record_price(&service, "BTC", 98.0).await.unwrap();
        assert!((change - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_monitor_stops_on_shutdown() {
        let dir = tempdir().unwrap();
        write_history(dir.path(), "bitcoin", &[100.0, 101.0]);
        let service = test_service(&dir);
        let (tx, rx) = watch::channel(false);

        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        };
        let finished = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(service.monitor(rx), stop);
        })
        .await;
        assert!(finished.is_ok());
    }
}
