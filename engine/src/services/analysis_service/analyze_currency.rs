// Handler for single-currency analysis
use super::AnalysisService;
use crate::analysis::analyze_series;
use crate::config::settings::CurrencyConfig;
use crate::error::{EngineError, Result};
use shared::models::{CurrencyAnalysis, PriceQuote};
use uuid::Uuid;

pub async fn handle_analyze_currency(
    service: &AnalysisService,
    symbol: &str,
) -> Result<CurrencyAnalysis> {
    let currency = service.config.currency(symbol).cloned().ok_or_else(|| {
        EngineError::ConfigError(format!(
            "currency '{}' is not configured or is disabled",
            symbol
        ))
    })?;
    let quote = service.provider.get_price(&currency.coin_id).await?;
    analyze_with_quote(service, &currency, quote).await
}

/// Runs the pipeline for `currency` using an already fetched quote.
pub(super) async fn analyze_with_quote(
    service: &AnalysisService,
    currency: &CurrencyConfig,
    quote: PriceQuote,
) -> Result<CurrencyAnalysis> {
    let days = service.config.analysis.lookback_days;
    let series = service
        .provider
        .get_market_data(&currency.coin_id, days)
        .await?;
    tracing::debug!(
        symbol = %currency.symbol,
        coin_id = %currency.coin_id,
        days,
        data_points = series.len(),
        "Market data retrieved"
    );

    let technical = analyze_series(&service.engine, &service.reducer, &series)?;
    let analysis = CurrencyAnalysis {
        analysis_id: Uuid::new_v4(),
        symbol: currency.symbol.clone(),
        name: currency.name.clone(),
        coin_id: currency.coin_id.clone(),
        quote,
        technical,
    };
    tracing::info!(
        analysis_id = %analysis.analysis_id,
        symbol = %analysis.symbol,
        signal = %analysis.technical.signal.label,
        recommendation = %analysis.technical.signal.recommendation,
        "Currency analysis complete"
    );
    Ok(analysis)
}
