// Moving Average Convergence Divergence (MACD)
use super::ema::ema;
use super::{IndicatorCalculator, MacdParams};
use serde_json::Value;
use shared::models::{IndicatorValue, MacdSeries, PriceSeries};

/// MACD line, signal line and histogram. Every position is defined because the
/// underlying EMAs seed from the first sample.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let ema_fast = ema(prices, fast);
    let ema_slow = ema(prices, slow);

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);
    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        line,
        signal: signal_line,
        histogram,
    }
}

pub struct Macd {
    params: MacdParams,
}

impl Macd {
    pub fn new(params: MacdParams) -> Self {
        Self { params }
    }
}

impl IndicatorCalculator for Macd {
    fn key(&self) -> &str {
        "MACD"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "fast": self.params.fast,
            "slow": self.params.slow,
            "signal": self.params.signal,
        })
    }

    fn calculate(&self, data: &PriceSeries) -> IndicatorValue {
        IndicatorValue::Macd(macd(
            &data.prices,
            self.params.fast,
            self.params.slow,
            self.params.signal,
        ))
    }
}
