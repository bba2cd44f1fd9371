// Handlers for provider lookups that involve no analysis
use super::AnalysisService;
use crate::error::{EngineError, Result};
use shared::models::{CoinInfo, PriceQuote};

pub async fn handle_coin_info(service: &AnalysisService, symbol: &str) -> Result<CoinInfo> {
    let coin_id = match service.config.currency(symbol) {
        Some(currency) => currency.coin_id.clone(),
        None => {
            return Err(EngineError::ConfigError(format!(
                "currency '{}' is not configured or is disabled",
                symbol
            )))
        }
    };
    service.provider.get_coin_info(&coin_id).await
}

/// Quotes for every enabled currency, keyed by symbol, in configuration order.
/// Currencies the provider has no quote for are left out.
pub async fn handle_prices(service: &AnalysisService) -> Result<Vec<(String, PriceQuote)>> {
    let currencies = service.config.enabled_currencies();
    let ids: Vec<String> = currencies.iter().map(|c| c.coin_id.clone()).collect();
    let mut quotes = service.provider.get_multiple_prices(&ids).await?;

    let mut prices = Vec::with_capacity(quotes.len());
    for currency in currencies {
        match quotes.remove(&currency.coin_id) {
            Some(quote) => prices.push((currency.symbol.clone(), quote)),
            None => tracing::warn!(symbol = %currency.symbol, "No quote returned"),
        }
    }
    Ok(prices)
}
