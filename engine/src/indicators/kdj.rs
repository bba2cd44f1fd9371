// KDJ stochastic oscillator
use super::{IndicatorCalculator, KdjParams};
use serde_json::Value;
use shared::models::{IndicatorValue, KdjSeries, PriceSeries};

/// Value reported for K, D and J before the first full lookback window.
pub const NEUTRAL: f64 = 50.0;

const PRIOR_WEIGHT: f64 = 2.0 / 3.0;
const CURRENT_WEIGHT: f64 = 1.0 / 3.0;

/// Raw stochastic value of `close` within `[lowest, highest]`; 50 for a flat window.
fn rsv(close: f64, highest: f64, lowest: f64) -> f64 {
    if highest == lowest {
        NEUTRAL
    } else {
        (close - lowest) / (highest - lowest) * 100.0
    }
}

/// KDJ over a trailing `period` window.
///
/// K and D use a fixed 2:1 recursive smoothing; the configured K/D periods do
/// not enter here (they drive SKDJ). Indices before `period - 1` are neutral.
/// Inputs of different lengths are read up to the shortest one.
pub fn kdj(high: &[f64], low: &[f64], close: &[f64], period: usize) -> KdjSeries {
    let n = close.len().min(high.len()).min(low.len());
    let mut k_values = Vec::with_capacity(n);
    let mut d_values = Vec::with_capacity(n);
    let mut j_values = Vec::with_capacity(n);

    let first_valid = period.saturating_sub(1);
    let mut prev: Option<(f64, f64)> = None;

    for i in 0..n {
        if period == 0 || i < first_valid {
            k_values.push(NEUTRAL);
            d_values.push(NEUTRAL);
            j_values.push(NEUTRAL);
            continue;
        }

        let start = i + 1 - period;
        let highest = high[start..=i]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let lowest = low[start..=i].iter().copied().fold(f64::INFINITY, f64::min);
        let raw = rsv(close[i], highest, lowest);

        let (k, d) = match prev {
            None => (raw, raw),
            Some((prev_k, prev_d)) => {
                let k = PRIOR_WEIGHT * prev_k + CURRENT_WEIGHT * raw;
                let d = PRIOR_WEIGHT * prev_d + CURRENT_WEIGHT * k;
                (k, d)
            }
        };
        prev = Some((k, d));

        k_values.push(k);
        d_values.push(d);
        j_values.push(3.0 * k - 2.0 * d);
    }

    KdjSeries {
        k: k_values,
        d: d_values,
        j: j_values,
    }
}

pub struct Kdj {
    params: KdjParams,
}

impl Kdj {
    pub fn new(params: KdjParams) -> Self {
        Self { params }
    }
}

impl IndicatorCalculator for Kdj {
    fn key(&self) -> &str {
        "KDJ"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "period": self.params.period,
            "k_period": self.params.k_period,
            "d_period": self.params.d_period,
        })
    }

    fn calculate(&self, data: &PriceSeries) -> IndicatorValue {
        IndicatorValue::Kdj(kdj(&data.high, &data.low, &data.prices, self.params.period))
    }
}
