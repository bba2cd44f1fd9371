// Technical indicators module
pub mod ema;
pub mod engine;
pub mod kdj;
pub mod macd;
pub mod obv;
pub mod skdj;
pub mod sma;

pub use self::engine::IndicatorEngine;
pub use self::kdj::Kdj;
pub use self::macd::Macd;
pub use self::obv::Obv;
pub use self::skdj::Skdj;
pub use self::sma::Ma;

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{IndicatorValue, PriceSeries};

// Common trait for all indicator families
pub trait IndicatorCalculator: Send + Sync {
    /// Key under which the output is stored in the indicator mapping (e.g. `MA5`).
    fn key(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters bound into this calculator instance
    /// Output has exactly `data.len()` steps; never mutates `data`.
    fn calculate(&self, data: &PriceSeries) -> IndicatorValue;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdjParams {
    pub period: usize,
    pub k_period: usize,
    pub d_period: usize,
}

/// Per-family parameter sets. `None` disables the family, which is then
/// omitted from the indicator mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParameters {
    pub ma_periods: Option<Vec<usize>>,
    pub macd: Option<MacdParams>,
    pub kdj: Option<KdjParams>,
    pub skdj: Option<KdjParams>,
    pub obv_period: Option<usize>,
}

impl Default for IndicatorParameters {
    fn default() -> Self {
        IndicatorParameters {
            ma_periods: Some(vec![5, 48, 180]),
            macd: Some(MacdParams { fast: 6, slow: 7, signal: 6 }),
            kdj: Some(KdjParams { period: 9, k_period: 3, d_period: 3 }),
            skdj: Some(KdjParams { period: 9, k_period: 3, d_period: 3 }),
            obv_period: Some(30),
        }
    }
}

fn require_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(EngineError::InvalidParameter(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

impl IndicatorParameters {
    /// Every parameter set with all families disabled.
    pub fn none() -> Self {
        IndicatorParameters {
            ma_periods: None,
            macd: None,
            kdj: None,
            skdj: None,
            obv_period: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(periods) = &self.ma_periods {
            if periods.is_empty() {
                return Err(EngineError::InvalidParameter(
                    "MA is enabled but no periods are configured".to_string(),
                ));
            }
            for &period in periods {
                require_positive("MA period", period)?;
            }
        }
        if let Some(macd) = &self.macd {
            require_positive("MACD fast span", macd.fast)?;
            require_positive("MACD slow span", macd.slow)?;
            require_positive("MACD signal span", macd.signal)?;
        }
        for (family, params) in [("KDJ", &self.kdj), ("SKDJ", &self.skdj)] {
            if let Some(p) = params {
                require_positive(&format!("{} period", family), p.period)?;
                require_positive(&format!("{} K-period", family), p.k_period)?;
                require_positive(&format!("{} D-period", family), p.d_period)?;
            }
        }
        if let Some(period) = self.obv_period {
            require_positive("OBV period", period)?;
        }
        Ok(())
    }
}
