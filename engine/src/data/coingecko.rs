// CoinGecko REST client
use super::{ApiStatus, MarketDataProvider, PriceCache};
use crate::config::settings::CoinGeckoConfig;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use shared::models::{CoinInfo, CoinListing, PriceQuote, PriceSeries};
use std::collections::HashMap;
use std::time::Duration;

const VS_CURRENCY: &str = "usd";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const DESCRIPTION_CHARS: usize = 200;

/// Ids kept from the full `/coins/list` catalogue.
const MAJOR_COINS: [&str; 10] = [
    "bitcoin",
    "ethereum",
    "binancecoin",
    "ripple",
    "cardano",
    "solana",
    "polkadot",
    "dogecoin",
    "matic-network",
    "chainlink",
];

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: f64,
    #[serde(default)]
    usd_market_cap: Option<f64>,
    #[serde(default)]
    usd_24h_vol: Option<f64>,
    #[serde(default)]
    usd_24h_change: Option<f64>,
    #[serde(default)]
    last_updated_at: Option<i64>,
}

/// `/coins/{id}/market_chart` payload; each point is `[timestamp_ms, value]`.
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

/// The subset of `/coins/{id}` read for [`CoinInfo`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CoinDetail {
    id: String,
    symbol: String,
    name: String,
    description: HashMap<String, String>,
    links: CoinLinks,
    genesis_date: Option<String>,
    market_cap_rank: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CoinLinks {
    homepage: Vec<String>,
}

pub struct CoinGeckoClient {
    base_url: String,
    http: reqwest::Client,
    quotes: PriceCache<PriceQuote>,
    series: PriceCache<PriceSeries>,
    info: PriceCache<CoinInfo>,
    listings: PriceCache<Vec<CoinListing>>,
}

impl CoinGeckoClient {
    pub fn new(config: &CoinGeckoConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("crypto-signal/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&config.api_key).map_err(|e| {
                EngineError::ConfigError(format!("invalid CoinGecko API key: {}", e))
            })?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let ttl = Duration::from_secs(config.cache_ttl);
        let client = CoinGeckoClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            quotes: PriceCache::new(ttl),
            series: PriceCache::new(ttl),
            info: PriceCache::new(ttl),
            listings: PriceCache::new(ttl),
        };
        tracing::debug!(
            base_url = %client.base_url,
            cache_ttl_secs = client.quotes.ttl().as_secs(),
            authenticated = !config.api_key.is_empty(),
            "CoinGecko client ready"
        );
        Ok(client)
    }

    async fn fetch_simple_prices(&self, ids: &str) -> Result<HashMap<String, SimplePrice>> {
        let url = format!("{}/simple/price", self.base_url);
        let body = self
            .http
            .get(&url)
            .query(&[
                ("ids", ids),
                ("vs_currencies", VS_CURRENCY),
                ("include_market_cap", "true"),
                ("include_24hr_vol", "true"),
                ("include_24hr_change", "true"),
                ("include_last_updated_at", "true"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }
}

fn price_cache_key(coin_id: &str) -> String {
    format!("price_{}_{}", coin_id, VS_CURRENCY)
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn get_price(&self, coin_id: &str) -> Result<PriceQuote> {
        let cache_key = price_cache_key(coin_id);
        if let Some(quote) = self.quotes.get(&cache_key).await {
            return Ok(quote);
        }

        let body = self.fetch_simple_prices(coin_id).await?;
        let quote = quote_from_response(coin_id, body)?;
        tracing::info!(coin_id, price = quote.price, "Fetched price");
        self.quotes.insert(cache_key, quote.clone()).await;
        Ok(quote)
    }

    async fn get_market_data(&self, coin_id: &str, days: u32) -> Result<PriceSeries> {
        let cache_key = format!("market_{}_{}", coin_id, days);
        if let Some(series) = self.series.get(&cache_key).await {
            return Ok(series);
        }

        let url = format!("{}/coins/{}/market_chart", self.base_url, coin_id);
        let days = days.to_string();
        let chart: MarketChart = self
            .http
            .get(&url)
            .query(&[
                ("vs_currency", VS_CURRENCY),
                ("days", days.as_str()),
                ("interval", "daily"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let series = series_from_chart(chart);
        if series.is_empty() {
            return Err(EngineError::MarketDataError(format!(
                "no price history returned for '{}'",
                coin_id
            )));
        }
        tracing::info!(coin_id, data_points = series.len(), "Fetched market data");
        self.series.insert(cache_key, series.clone()).await;
        Ok(series)
    }

    async fn get_coin_info(&self, coin_id: &str) -> Result<CoinInfo> {
        let cache_key = format!("info_{}", coin_id);
        if let Some(info) = self.info.get(&cache_key).await {
            return Ok(info);
        }

        let url = format!("{}/coins/{}", self.base_url, coin_id);
        let detail: CoinDetail = self
            .http
            .get(&url)
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
                ("sparkline", "false"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info = info_from_detail(detail);
        tracing::info!(coin_id, name = %info.name, "Fetched coin info");
        self.info.insert(cache_key, info.clone()).await;
        Ok(info)
    }

    async fn get_multiple_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, PriceQuote>> {
        if coin_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let body = self.fetch_simple_prices(&coin_ids.join(",")).await?;
        let quotes = quotes_from_response(coin_ids, body);
        for (coin_id, quote) in &quotes {
            self.quotes.insert(price_cache_key(coin_id), quote.clone()).await;
        }
        tracing::info!(requested = coin_ids.len(), found = quotes.len(), "Fetched prices");
        Ok(quotes)
    }

    async fn get_supported_coins(&self) -> Result<Vec<CoinListing>> {
        let cache_key = "supported_coins";
        if let Some(listings) = self.listings.get(cache_key).await {
            return Ok(listings);
        }

        let url = format!("{}/coins/list", self.base_url);
        let all: Vec<CoinListing> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let major = major_coins(all);
        tracing::info!(count = major.len(), "Fetched supported coins");
        self.listings.insert(cache_key, major.clone()).await;
        Ok(major)
    }

    async fn check_status(&self) -> ApiStatus {
        let url = format!("{}/ping", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => ApiStatus::Online,
            Ok(resp) => ApiStatus::Error(resp.status().to_string()),
            Err(e) => {
                tracing::error!(error = %e, "CoinGecko status check failed");
                ApiStatus::Offline(e.to_string())
            }
        }
    }
}

fn quote_from_response(coin_id: &str, mut body: HashMap<String, SimplePrice>) -> Result<PriceQuote> {
    let entry = body
        .remove(coin_id)
        .ok_or_else(|| EngineError::MarketDataError(format!("coin '{}' not found", coin_id)))?;
    Ok(quote_from_entry(entry))
}

fn quote_from_entry(entry: SimplePrice) -> PriceQuote {
    PriceQuote {
        price: entry.usd,
        market_cap: entry.usd_market_cap.unwrap_or_default(),
        volume_24h: entry.usd_24h_vol.unwrap_or_default(),
        change_24h: entry.usd_24h_change.unwrap_or_default(),
        last_updated: entry.last_updated_at.unwrap_or_default(),
        fetched_at: Utc::now(),
    }
}

fn quotes_from_response(
    coin_ids: &[String],
    mut body: HashMap<String, SimplePrice>,
) -> HashMap<String, PriceQuote> {
    coin_ids
        .iter()
        .filter_map(|id| body.remove(id).map(|entry| (id.clone(), quote_from_entry(entry))))
        .collect()
}

fn info_from_detail(detail: CoinDetail) -> CoinInfo {
    let english = detail.description.get("en").map(String::as_str).unwrap_or("");
    let description = match english.char_indices().nth(DESCRIPTION_CHARS) {
        Some((cut, _)) => format!("{}...", &english[..cut]),
        None => english.to_string(),
    };
    CoinInfo {
        id: detail.id,
        symbol: detail.symbol.to_uppercase(),
        name: detail.name,
        description,
        homepage: detail.links.homepage.into_iter().find(|url| !url.is_empty()),
        genesis_date: detail.genesis_date.filter(|d| !d.is_empty()),
        market_cap_rank: detail.market_cap_rank,
        fetched_at: Utc::now(),
    }
}

fn major_coins(all: Vec<CoinListing>) -> Vec<CoinListing> {
    all.into_iter()
        .filter(|coin| MAJOR_COINS.contains(&coin.id.as_str()))
        .collect()
}

fn series_from_chart(chart: MarketChart) -> PriceSeries {
    let prices: Vec<f64> = chart.prices.iter().map(|(_, p)| *p).collect();
    let volumes: Vec<f64> = (0..prices.len())
        .map(|i| chart.total_volumes.get(i).map(|(_, v)| *v).unwrap_or(0.0))
        .collect();
    let (high, low) = synthesize_range(&prices);
    PriceSeries {
        prices,
        high,
        low,
        volumes,
    }
}

/// The daily chart has closes only. High/low are derived from each close and
/// the previous one; the first sample gets a +/-1% band.
pub(crate) fn synthesize_range(prices: &[f64]) -> (Vec<f64>, Vec<f64>) {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| match i {
            0 => (p * 1.01, p * 0.99),
            _ => (p.max(prices[i - 1]), p.min(prices[i - 1])),
        })
        .unzip()
}
