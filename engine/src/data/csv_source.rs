// Offline market data read from per-coin CSV files
use super::{ApiStatus, MarketDataProvider};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord};
use shared::models::{Candle, CoinInfo, CoinListing, PriceQuote, PriceSeries};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Parses timestamps given either as RFC 3339 or as a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| EngineError::CsvDataFormatError(format!("Failed to parse timestamp '{}'", s)))
}

fn parse_number(s: &str) -> std::result::Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse number '{}': {}", s, e))
}

pub struct CsvParser;

impl CsvParser {
    // CSV Header: timestamp,price,high,low,volume
    // Example Row: 2024-06-01,67012.35,67500.00,66210.10,21034567890.5
    pub fn load_candles(path: &Path) -> Result<Vec<Candle>> {
        let file = File::open(path)?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let mut candles = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let record = result?;
            let line = idx + 2;

            let timestamp = parse_timestamp(Self::required(&record, &headers, "timestamp", line)?)
                .map_err(|e| EngineError::CsvDataFormatError(format!("line {}: {}", line, e)))?;
            let price = Self::number(&record, &headers, "price", line)?;
            // high/low/volume are optional columns; fall back to the price / zero.
            let high = Self::optional_number(&record, &headers, "high", line)?.unwrap_or(price);
            let low = Self::optional_number(&record, &headers, "low", line)?.unwrap_or(price);
            let volume = Self::optional_number(&record, &headers, "volume", line)?.unwrap_or(0.0);

            candles.push(Candle {
                timestamp,
                price,
                high,
                low,
                volume,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        tracing::debug!(path = %path.display(), rows = candles.len(), "Loaded CSV market data");
        Ok(candles)
    }

    fn field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .and_then(|i| record.get(i))
            .filter(|v| !v.is_empty())
    }

    fn required<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
        Self::field(record, headers, name).ok_or_else(|| {
            EngineError::CsvDataFormatError(format!("Missing '{}' field in CSV record at line {}", name, line))
        })
    }

    fn number(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<f64> {
        let raw = Self::required(record, headers, name, line)?;
        parse_number(raw).map_err(|e| {
            EngineError::CsvDataFormatError(format!("Error parsing '{}' at line {}: {}", name, line, e))
        })
    }

    fn optional_number(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<Option<f64>> {
        Self::field(record, headers, name)
            .map(|raw| {
                parse_number(raw).map_err(|e| {
                    EngineError::CsvDataFormatError(format!("Error parsing '{}' at line {}: {}", name, line, e))
                })
            })
            .transpose()
    }
}

/// Provider reading `{directory}/{coin_id}.csv`. File access runs on the
/// blocking thread pool.
pub struct CsvMarketData {
    directory: PathBuf,
}

impl CsvMarketData {
    pub fn new(directory: PathBuf) -> Self {
        CsvMarketData { directory }
    }

    fn path_for(&self, coin_id: &str) -> PathBuf {
        self.directory.join(format!("{}.csv", coin_id))
    }

    async fn candles(&self, coin_id: &str) -> Result<Vec<Candle>> {
        let path = self.path_for(coin_id);
        let coin_id = coin_id.to_string();
        tokio::task::spawn_blocking(move || read_candles(&path, &coin_id))
            .await
            .map_err(|e| EngineError::MarketDataError(format!("CSV reader task failed: {}", e)))?
    }
}

fn read_candles(path: &Path, coin_id: &str) -> Result<Vec<Candle>> {
    if !path.exists() {
        return Err(EngineError::MarketDataError(format!(
            "no data file for '{}' at {}",
            coin_id,
            path.display()
        )));
    }
    let candles = CsvParser::load_candles(path)?;
    if candles.is_empty() {
        return Err(EngineError::MarketDataError(format!(
            "data file for '{}' has no rows",
            coin_id
        )));
    }
    Ok(candles)
}

/// Quote from the newest row; the 24h change compares it with the row before.
fn quote_from_candles(candles: &[Candle]) -> Option<PriceQuote> {
    let (last, earlier) = candles.split_last()?;
    let change_24h = match earlier.last() {
        Some(prev) if prev.price != 0.0 => (last.price - prev.price) / prev.price * 100.0,
        _ => 0.0,
    };
    Some(PriceQuote {
        price: last.price,
        market_cap: 0.0,
        volume_24h: last.volume,
        change_24h,
        last_updated: last.timestamp.timestamp(),
        fetched_at: Utc::now(),
    })
}

/// `matic-network` -> `Matic Network`
fn display_name(coin_id: &str) -> String {
    coin_id
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn list_coin_files(directory: &Path) -> Result<Vec<CoinListing>> {
    let mut listings = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
            listings.push(CoinListing {
                id: id.to_string(),
                symbol: id.to_uppercase(),
                name: display_name(id),
            });
        }
    }
    listings.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(listings)
}

#[async_trait]
impl MarketDataProvider for CsvMarketData {
    fn name(&self) -> &str {
        "csv"
    }

    async fn get_price(&self, coin_id: &str) -> Result<PriceQuote> {
        let candles = self.candles(coin_id).await?;
        quote_from_candles(&candles).ok_or_else(|| {
            EngineError::MarketDataError(format!("data file for '{}' has no rows", coin_id))
        })
    }

    async fn get_market_data(&self, coin_id: &str, days: u32) -> Result<PriceSeries> {
        let candles = self.candles(coin_id).await?;
        let newest = candles[candles.len() - 1].timestamp;
        let cutoff = newest - Duration::days(i64::from(days));
        let window: Vec<Candle> = candles
            .into_iter()
            .filter(|c| c.timestamp >= cutoff)
            .collect();
        Ok(PriceSeries::from_candles(&window))
    }

    async fn get_coin_info(&self, coin_id: &str) -> Result<CoinInfo> {
        let candles = self.candles(coin_id).await?;
        let first = &candles[0];
        let last = &candles[candles.len() - 1];
        Ok(CoinInfo {
            id: coin_id.to_string(),
            symbol: coin_id.to_uppercase(),
            name: display_name(coin_id),
            description: format!(
                "Offline history: {} rows from {} to {}",
                candles.len(),
                first.timestamp.format("%Y-%m-%d"),
                last.timestamp.format("%Y-%m-%d")
            ),
            homepage: None,
            genesis_date: None,
            market_cap_rank: None,
            fetched_at: Utc::now(),
        })
    }

    async fn get_multiple_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, PriceQuote>> {
        let mut quotes = HashMap::new();
        for coin_id in coin_ids {
            if !self.path_for(coin_id).exists() {
                tracing::debug!(coin_id = %coin_id, "No data file, skipping");
                continue;
            }
            let candles = self.candles(coin_id).await?;
            if let Some(quote) = quote_from_candles(&candles) {
                quotes.insert(coin_id.clone(), quote);
            }
        }
        Ok(quotes)
    }

    async fn get_supported_coins(&self) -> Result<Vec<CoinListing>> {
        let directory = self.directory.clone();
        tokio::task::spawn_blocking(move || list_coin_files(&directory))
            .await
            .map_err(|e| EngineError::MarketDataError(format!("CSV listing task failed: {}", e)))?
    }

    async fn check_status(&self) -> ApiStatus {
        if self.directory.is_dir() {
            ApiStatus::Online
        } else {
            ApiStatus::Offline(format!("{} is not a directory", self.directory.display()))
        }
    }
}
