// Market-data providers
pub mod cache;
pub mod coingecko;
pub mod csv_source;

pub use cache::PriceCache;
pub use coingecko::CoinGeckoClient;
pub use csv_source::CsvMarketData;

use crate::config::settings::{ApiConfig, ProviderKind};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use shared::models::{CoinInfo, CoinListing, PriceQuote, PriceSeries};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Online,
    /// Reachable but answered with a non-success status.
    Error(String),
    Offline(String),
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiStatus::Online => f.write_str("online"),
            ApiStatus::Error(detail) => write!(f, "error ({})", detail),
            ApiStatus::Offline(detail) => write!(f, "offline ({})", detail),
        }
    }
}

/// Supplies quotes and historical series; the indicator engine never fetches data itself.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_price(&self, coin_id: &str) -> Result<PriceQuote>;

    /// Daily samples for the last `days` days, oldest first.
    async fn get_market_data(&self, coin_id: &str, days: u32) -> Result<PriceSeries>;

    async fn get_coin_info(&self, coin_id: &str) -> Result<CoinInfo>;

    /// Quotes for every id the provider knows; unknown ids are left out.
    async fn get_multiple_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, PriceQuote>>;

    async fn get_supported_coins(&self) -> Result<Vec<CoinListing>>;

    async fn check_status(&self) -> ApiStatus;
}

/// Builds the provider selected in the configuration.
pub fn provider_from_config(api: &ApiConfig) -> Result<Arc<dyn MarketDataProvider>> {
    let provider: Arc<dyn MarketDataProvider> = match api.provider {
        ProviderKind::CoinGecko => Arc::new(CoinGeckoClient::new(&api.coingecko)?),
        ProviderKind::Csv => Arc::new(CsvMarketData::new(api.csv.directory.clone())),
    };
    tracing::info!(provider = provider.name(), "Market data provider ready");
    Ok(provider)
}
