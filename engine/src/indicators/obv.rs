// On-Balance Volume (OBV) indicator implementation
use super::sma::moving_average;
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::{IndicatorValue, PriceSeries, Series};
use std::cmp::Ordering;

/// Cumulative OBV starting from 0 at the first sample. Stops at the end of
/// the shorter input.
pub fn on_balance_volume(close: &[f64], volume: &[f64]) -> Vec<f64> {
    let n = close.len().min(volume.len());
    if n == 0 {
        return Vec::new();
    }

    let mut results = Vec::with_capacity(n);
    let mut running = 0.0;
    results.push(running);

    for i in 1..n {
        match close[i].partial_cmp(&close[i - 1]) {
            Some(Ordering::Greater) => running += volume[i],
            Some(Ordering::Less) => running -= volume[i],
            _ => {}
        }
        results.push(running);
    }
    results
}

/// OBV smoothed by an MA of `period` when there are at least `period` samples,
/// otherwise the raw cumulative series.
pub fn obv(close: &[f64], volume: &[f64], period: usize) -> Series {
    let raw = on_balance_volume(close, volume);
    if period > 0 && raw.len() >= period {
        moving_average(&raw, period)
    } else {
        raw.into_iter().map(Some).collect()
    }
}

pub struct Obv {
    period: usize,
}

impl Obv {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl IndicatorCalculator for Obv {
    fn key(&self) -> &str {
        "OBV"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &PriceSeries) -> IndicatorValue {
        IndicatorValue::Line {
            values: obv(&data.prices, &data.volumes, self.period),
        }
    }
}
