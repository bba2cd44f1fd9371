// Slow KDJ: the KDJ lines re-smoothed with plain moving averages
use super::kdj::kdj;
use super::sma::moving_average;
use super::{IndicatorCalculator, KdjParams};
use serde_json::Value;
use shared::models::{IndicatorValue, PriceSeries, SkdjSeries};

pub fn skdj(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    k_period: usize,
    d_period: usize,
) -> SkdjSeries {
    let fast = kdj(high, low, close, period);
    let sk = moving_average(&fast.k, k_period);
    let sd = moving_average(&fast.d, d_period);
    let sj = sk
        .iter()
        .zip(&sd)
        .map(|(k, d)| match (k, d) {
            (Some(k), Some(d)) => Some(3.0 * k - 2.0 * d),
            _ => None,
        })
        .collect();

    SkdjSeries { sk, sd, sj }
}

pub struct Skdj {
    params: KdjParams,
}

impl Skdj {
    pub fn new(params: KdjParams) -> Self {
        Self { params }
    }
}

impl IndicatorCalculator for Skdj {
    fn key(&self) -> &str {
        "SKDJ"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "period": self.params.period,
            "k_period": self.params.k_period,
            "d_period": self.params.d_period,
        })
    }

    fn calculate(&self, data: &PriceSeries) -> IndicatorValue {
        IndicatorValue::Skdj(skdj(
            &data.high,
            &data.low,
            &data.prices,
            self.params.period,
            self.params.k_period,
            self.params.d_period,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::kdj::NEUTRAL;

    #[test]
    fn test_skdj_undefined_prefix_follows_windows() {
        let close: Vec<f64> = (1..=15).map(|v| v as f64).collect();
        let result = skdj(&close, &close, &close, 9, 3, 5);
        assert_eq!(result.sk.len(), 15);
        assert!(result.sk[..2].iter().all(Option::is_none));
        assert!(result.sk[2].is_some());
        assert!(result.sd[..4].iter().all(Option::is_none));
        // SJ needs both lines.
        assert!(result.sj[..4].iter().all(Option::is_none));
        assert!(result.sj[4].is_some());
    }

    #[test]
    fn test_skdj_neutral_region_stays_neutral() {
        let close: Vec<f64> = (1..=12).map(|v| v as f64).collect();
        let result = skdj(&close, &close, &close, 9, 3, 3);
        // Windows fully inside the neutral KDJ prefix average to 50.
        assert_eq!(result.sk[2], Some(NEUTRAL));
        assert_eq!(result.sj[2], Some(NEUTRAL));
    }

    #[test]
    fn test_skdj_j_identity() {
        let high = [11.0, 12.0, 13.0, 12.5, 14.0, 13.0, 15.0];
        let low = [9.0, 10.0, 11.0, 10.5, 12.0, 11.0, 12.5];
        let close = [10.0, 11.5, 12.0, 11.0, 13.5, 12.0, 14.0];
        let result = skdj(&high, &low, &close, 3, 2, 2);
        for i in 0..close.len() {
            if let (Some(k), Some(d), Some(j)) = (result.sk[i], result.sd[i], result.sj[i]) {
                assert!((j - (3.0 * k - 2.0 * d)).abs() < 1e-12);
            }
        }
    }
}
