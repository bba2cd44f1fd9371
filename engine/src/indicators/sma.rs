// Simple Moving Average (MA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::{IndicatorValue, PriceSeries, Series};

/// Trailing arithmetic mean over `period` samples, computed with a rolling sum.
///
/// Positions `0..period-1` are `None`; a series shorter than `period` is all `None`.
pub fn moving_average(values: &[f64], period: usize) -> Series {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }

    let mut results = vec![None; period - 1];

    let mut sum: f64 = values.iter().take(period).sum();
    results.push(Some(sum / period as f64));

    for i in period..values.len() {
        sum = sum - values[i - period] + values[i];
        results.push(Some(sum / period as f64));
    }
    results
}

pub struct Ma {
    key: String,
    period: usize,
}

impl Ma {
    pub fn new(period: usize) -> Self {
        Self {
            key: format!("MA{}", period),
            period,
        }
    }
}

impl IndicatorCalculator for Ma {
    fn key(&self) -> &str {
        &self.key
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &PriceSeries) -> IndicatorValue {
        IndicatorValue::Line {
            values: moving_average(&data.prices, self.period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ma_calculation() {
        let results = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        // expected: None, None, (1+2+3)/3=2.0, (2+3+4)/3=3.0, (3+4+5)/3=4.0
        assert_eq!(results, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_ma_ten_step_ramp() {
        let prices: Vec<f64> = (100..110).map(|p| p as f64).collect();
        let results = moving_average(&prices, 5);
        assert_eq!(results.len(), 10);
        assert!(results[..4].iter().all(Option::is_none));
        assert_eq!(results[4], Some(102.0));
        assert_eq!(results[9], Some(107.0));
    }

    #[test]
    fn test_ma_insufficient_data() {
        let results = moving_average(&[1.0, 2.0], 3);
        assert_eq!(results, vec![None, None]);
    }

    #[test]
    fn test_ma_period_one() {
        // MA(1) is just the price
        let results = moving_average(&[1.0, 2.0, 3.0], 1);
        assert_eq!(results, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_ma_empty_data() {
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn test_ma_calculator_key() {
        let ma = Ma::new(48);
        assert_eq!(ma.key(), "MA48");
        assert_eq!(ma.parameters()["period"], 48);
        let out = ma.calculate(&PriceSeries::from_closes(vec![1.0; 10]));
        assert_eq!(out.len(), 10);
    }
}
