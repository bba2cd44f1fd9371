use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single time step of market data as delivered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

/// Chronologically ordered price/volume observations, oldest first.
///
/// All four lists are parallel: index `i` in each refers to the same time step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceSeries {
    pub prices: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl PriceSeries {
    /// Builds a series from closes only: high and low equal the close and volume is zero.
    pub fn from_closes(prices: Vec<f64>) -> Self {
        let n = prices.len();
        Self {
            high: prices.clone(),
            low: prices.clone(),
            volumes: vec![0.0; n],
            prices,
        }
    }

    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            prices: candles.iter().map(|c| c.price).collect(),
            high: candles.iter().map(|c| c.high).collect(),
            low: candles.iter().map(|c| c.low).collect(),
            volumes: candles.iter().map(|c| c.volume).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }
}

/// Spot quote for an asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    /// 24h change in percent.
    pub change_24h: f64,
    /// Unix seconds as reported by the provider.
    pub last_updated: i64,
    pub fetched_at: DateTime<Utc>,
}

/// Descriptive metadata for an asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinInfo {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Short English description, truncated with `...` when long.
    pub description: String,
    pub homepage: Option<String>,
    pub genesis_date: Option<String>,
    pub market_cap_rank: Option<u32>,
    pub fetched_at: DateTime<Utc>,
}

/// An asset the provider can quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoinListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// `None` marks a position where the indicator has insufficient history.
pub type Series = Vec<Option<f64>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KdjSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkdjSeries {
    pub sk: Series,
    pub sd: Series,
    pub sj: Series,
}

/// Output of one indicator family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorValue {
    Line { values: Series },
    Macd(MacdSeries),
    Kdj(KdjSeries),
    Skdj(SkdjSeries),
}

impl IndicatorValue {
    /// Number of time steps covered by this output.
    pub fn len(&self) -> usize {
        match self {
            IndicatorValue::Line { values } => values.len(),
            IndicatorValue::Macd(m) => m.line.len(),
            IndicatorValue::Kdj(k) => k.k.len(),
            IndicatorValue::Skdj(s) => s.sk.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mapping from indicator key (`MA5`, `MACD`, `KDJ`, `SKDJ`, `OBV`) to its output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct IndicatorResult {
    entries: BTreeMap<String, IndicatorValue>,
}

impl IndicatorResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: IndicatorValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndicatorValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A single-line output such as `MA5` or `OBV`.
    pub fn line(&self, key: &str) -> Option<&Series> {
        match self.entries.get(key) {
            Some(IndicatorValue::Line { values }) => Some(values),
            _ => None,
        }
    }

    pub fn macd(&self) -> Option<&MacdSeries> {
        match self.entries.get("MACD") {
            Some(IndicatorValue::Macd(m)) => Some(m),
            _ => None,
        }
    }

    pub fn kdj(&self) -> Option<&KdjSeries> {
        match self.entries.get("KDJ") {
            Some(IndicatorValue::Kdj(k)) => Some(k),
            _ => None,
        }
    }

    pub fn skdj(&self) -> Option<&SkdjSeries> {
        match self.entries.get("SKDJ") {
            Some(IndicatorValue::Skdj(s)) => Some(s),
            _ => None,
        }
    }

    /// All `MA{period}` lines, ordered by period.
    pub fn moving_averages(&self) -> Vec<(usize, &Series)> {
        let mut out: Vec<(usize, &Series)> = self
            .entries
            .iter()
            .filter_map(|(key, value)| {
                let period = key.strip_prefix("MA")?.parse::<usize>().ok()?;
                match value {
                    IndicatorValue::Line { values } => Some((period, values)),
                    _ => None,
                }
            })
            .collect();
        out.sort_by_key(|(period, _)| *period);
        out
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SignalLabel {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
    Error,
}

impl SignalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::StrongBuy => "strong-buy",
            SignalLabel::Buy => "buy",
            SignalLabel::Hold => "hold",
            SignalLabel::Sell => "sell",
            SignalLabel::StrongSell => "strong-sell",
            SignalLabel::Error => "error",
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            SignalLabel::StrongBuy | SignalLabel::Buy => Recommendation::Buy,
            SignalLabel::StrongSell | SignalLabel::Sell => Recommendation::Sell,
            SignalLabel::Hold | SignalLabel::Error => Recommendation::Hold,
        }
    }
}

impl std::fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Recommendation::Buy => "buy",
            Recommendation::Sell => "sell",
            Recommendation::Hold => "hold",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalRecord {
    pub label: SignalLabel,
    /// In `[0.0, 1.0]`.
    pub strength: f64,
    pub rationale: String,
    pub recommendation: Recommendation,
}

impl SignalRecord {
    /// Fail-closed record used when the reducer cannot evaluate its inputs.
    pub fn error(rationale: impl Into<String>) -> Self {
        Self {
            label: SignalLabel::Error,
            strength: 0.0,
            rationale: rationale.into(),
            recommendation: Recommendation::Hold,
        }
    }
}

/// Indicator mapping plus the reduced signal for one series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicalAnalysis {
    pub current_price: f64,
    pub data_points: usize,
    pub indicators: IndicatorResult,
    pub signal: SignalRecord,
    pub analyzed_at: DateTime<Utc>,
}

/// Full per-currency result handed to report sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencyAnalysis {
    pub analysis_id: Uuid,
    pub symbol: String,
    pub name: String,
    pub coin_id: String,
    pub quote: PriceQuote,
    pub technical: TechnicalAnalysis,
}
