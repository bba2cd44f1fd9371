//! Reduces an indicator mapping and the latest price to a single trading signal.
//!
//! Each indicator family contributes a vote in `[-1, 1]` with a fixed weight.
//! The weighted mean of the votes is thresholded into five labels. MACD and
//! KDJ are required inputs; MA and OBV contribute only when present. Anything
//! the reducer cannot evaluate yields an `error` record with zero strength
//! instead of an `Err`.

use shared::models::{IndicatorResult, SignalLabel, SignalRecord};

const MA_WEIGHT: f64 = 0.30;
const MACD_WEIGHT: f64 = 0.30;
const KDJ_WEIGHT: f64 = 0.25;
const OBV_WEIGHT: f64 = 0.15;

/// Histogram vote scale once a crossover is older than one step.
const ESTABLISHED_TREND_SCALE: f64 = 0.75;

const STRONG_THRESHOLD: f64 = 0.6;
const WEAK_THRESHOLD: f64 = 0.2;

const KDJ_OVERSOLD: f64 = 0.0;
const KDJ_OVERBOUGHT: f64 = 100.0;

/// One indicator's contribution to the score.
#[derive(Debug, Clone, PartialEq)]
struct Component {
    weight: f64,
    vote: f64,
    reading: String,
}

#[derive(Debug, Clone, Default)]
pub struct SignalReducer;

impl SignalReducer {
    pub fn new() -> Self {
        SignalReducer
    }

    /// Pure function of `indicators` and `current_price`.
    pub fn reduce(&self, indicators: &IndicatorResult, current_price: f64) -> SignalRecord {
        if !current_price.is_finite() {
            return SignalRecord::error(format!(
                "current price {} is not a finite number",
                current_price
            ));
        }

        let macd = match macd_component(indicators) {
            Ok(c) => c,
            Err(reason) => return SignalRecord::error(reason),
        };
        let kdj = match kdj_component(indicators) {
            Ok(c) => c,
            Err(reason) => return SignalRecord::error(reason),
        };

        let components: Vec<Component> = [
            ma_component(indicators, current_price),
            Some(macd),
            Some(kdj),
            obv_component(indicators),
        ]
        .into_iter()
        .flatten()
        .collect();

        let total_weight: f64 = components.iter().map(|c| c.weight).sum();
        let score = components.iter().map(|c| c.weight * c.vote).sum::<f64>() / total_weight;
        let label = label_for_score(score);

        let rationale = components
            .iter()
            .map(|c| c.reading.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        tracing::debug!(score, label = %label, "Signal reduced");

        SignalRecord {
            label,
            strength: strength_for_score(score),
            rationale: format!("score {:+.2}: {}", score, rationale),
            recommendation: label.recommendation(),
        }
    }
}

fn label_for_score(score: f64) -> SignalLabel {
    if score >= STRONG_THRESHOLD {
        SignalLabel::StrongBuy
    } else if score >= WEAK_THRESHOLD {
        SignalLabel::Buy
    } else if score > -WEAK_THRESHOLD {
        SignalLabel::Hold
    } else if score > -STRONG_THRESHOLD {
        SignalLabel::Sell
    } else {
        SignalLabel::StrongSell
    }
}

/// Grows with label severity: hold sits near 0.5, strong labels at 0.8 and above.
fn strength_for_score(score: f64) -> f64 {
    (0.5 + score.abs() / 2.0).clamp(0.0, 1.0)
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

fn ma_component(indicators: &IndicatorResult, price: f64) -> Option<Component> {
    let readings: Vec<(usize, f64)> = indicators
        .moving_averages()
        .into_iter()
        .filter_map(|(period, series)| series.last().copied().flatten().map(|v| (period, v)))
        .collect();
    if readings.is_empty() {
        return None;
    }

    let vote = readings.iter().map(|(_, ma)| sign(price - ma)).sum::<f64>() / readings.len() as f64;
    let detail = readings
        .iter()
        .map(|(period, ma)| {
            let side = if price > *ma {
                "above"
            } else if price < *ma {
                "below"
            } else {
                "at"
            };
            format!("{} MA{} ({:.2})", side, period, ma)
        })
        .collect::<Vec<_>>()
        .join(", ");

    Some(Component {
        weight: MA_WEIGHT,
        vote,
        reading: format!("price {:.2} {}", price, detail),
    })
}

fn macd_component(indicators: &IndicatorResult) -> Result<Component, String> {
    let macd = indicators
        .macd()
        .ok_or_else(|| "MACD indicator missing from analysis".to_string())?;
    let n = macd.histogram.len();
    let last = *macd
        .histogram
        .last()
        .ok_or_else(|| "MACD histogram is empty".to_string())?;
    if !last.is_finite() {
        return Err("MACD histogram is not finite".to_string());
    }

    let previous = if n >= 2 { macd.histogram[n - 2] } else { 0.0 };
    let crossed = sign(last) != 0.0 && sign(last) != sign(previous);
    let (vote, reading) = if crossed {
        let direction = if last > 0.0 { "bullish" } else { "bearish" };
        (sign(last), format!("MACD {} crossover (histogram {:+.4})", direction, last))
    } else {
        let direction = match sign(last) {
            s if s > 0.0 => "positive",
            s if s < 0.0 => "negative",
            _ => "flat",
        };
        (
            sign(last) * ESTABLISHED_TREND_SCALE,
            format!("MACD histogram {} ({:+.4})", direction, last),
        )
    };

    Ok(Component {
        weight: MACD_WEIGHT,
        vote,
        reading,
    })
}

fn kdj_component(indicators: &IndicatorResult) -> Result<Component, String> {
    let kdj = indicators
        .kdj()
        .ok_or_else(|| "KDJ indicator missing from analysis".to_string())?;
    let (k, d, j) = match (kdj.k.last(), kdj.d.last(), kdj.j.last()) {
        (Some(&k), Some(&d), Some(&j)) => (k, d, j),
        _ => return Err("KDJ series is empty".to_string()),
    };
    if !(k.is_finite() && d.is_finite() && j.is_finite()) {
        return Err("KDJ values are not finite".to_string());
    }

    let (vote, reading) = if j < KDJ_OVERSOLD {
        (1.0, format!("KDJ oversold (J {:.1})", j))
    } else if j > KDJ_OVERBOUGHT {
        (-1.0, format!("KDJ overbought (J {:.1})", j))
    } else if k > d {
        (0.5, format!("KDJ K {:.1} above D {:.1}", k, d))
    } else if k < d {
        (-0.5, format!("KDJ K {:.1} below D {:.1}", k, d))
    } else {
        (0.0, format!("KDJ neutral (K = D = {:.1})", k))
    };

    Ok(Component {
        weight: KDJ_WEIGHT,
        vote,
        reading,
    })
}

fn obv_component(indicators: &IndicatorResult) -> Option<Component> {
    let series = indicators.line("OBV")?;
    let idx = series.iter().rposition(Option::is_some)?;
    let last = series[idx]?;
    let previous = last_defined(&series[..idx])?;

    let delta = last - previous;
    let reading = match sign(delta) {
        s if s > 0.0 => format!("OBV rising ({:+.2})", delta),
        s if s < 0.0 => format!("OBV falling ({:+.2})", delta),
        _ => "OBV unchanged".to_string(),
    };
    Some(Component {
        weight: OBV_WEIGHT,
        vote: sign(delta),
        reading,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{IndicatorValue, KdjSeries, MacdSeries, Recommendation};

    fn mapping(histogram: Vec<f64>, k: f64, d: f64, ma: Option<f64>, obv: Option<(f64, f64)>) -> IndicatorResult {
        let n = histogram.len();
        let mut result = IndicatorResult::new();
        result.insert(
            "MACD",
            IndicatorValue::Macd(MacdSeries {
                line: histogram.clone(),
                signal: vec![0.0; n],
                histogram,
            }),
        );
        result.insert(
            "KDJ",
            IndicatorValue::Kdj(KdjSeries {
                k: vec![k],
                d: vec![d],
                j: vec![3.0 * k - 2.0 * d],
            }),
        );
        if let Some(ma) = ma {
            result.insert("MA5", IndicatorValue::Line { values: vec![None, Some(ma)] });
        }
        if let Some((a, b)) = obv {
            result.insert("OBV", IndicatorValue::Line { values: vec![Some(a), Some(b)] });
        }
        result
    }

    #[test]
    fn test_all_bullish_is_strong_buy() {
        let indicators = mapping(vec![-0.1, 0.5], 60.0, 50.0, Some(90.0), Some((1.0, 5.0)));
        let record = SignalReducer::new().reduce(&indicators, 100.0);
        assert_eq!(record.label, SignalLabel::StrongBuy);
        assert_eq!(record.recommendation, Recommendation::Buy);
        assert!(record.strength >= 0.8);
        assert!(record.rationale.contains("MACD bullish crossover"));
        assert!(record.rationale.contains("above MA5"));
        assert!(record.rationale.contains("OBV rising"));
    }

    #[test]
    fn test_all_bearish_is_strong_sell() {
        let indicators = mapping(vec![0.1, -0.5], 40.0, 50.0, Some(110.0), Some((5.0, 1.0)));
        let record = SignalReducer::new().reduce(&indicators, 100.0);
        assert_eq!(record.label, SignalLabel::StrongSell);
        assert_eq!(record.recommendation, Recommendation::Sell);
        assert!(record.strength >= 0.8);
    }

    #[test]
    fn test_mixed_readings_hold() {
        // MACD positive (established), KDJ flat, price below MA => mixed.
        let indicators = mapping(vec![0.2, 0.3], 50.0, 50.0, Some(101.0), None);
        let record = SignalReducer::new().reduce(&indicators, 100.0);
        // votes: MA -1 (0.30), MACD +0.75 (0.30), KDJ 0 (0.25) => score -0.075/0.85
        assert_eq!(record.label, SignalLabel::Hold);
        assert_eq!(record.recommendation, Recommendation::Hold);
        assert!((record.strength - 0.5).abs() < 0.1);
    }

    #[test]
    fn test_kdj_overbought_drives_sell() {
        // J = 3*95 - 2*80 = 125 > 100
        let indicators = mapping(vec![-0.2, -0.1], 95.0, 80.0, None, None);
        let record = SignalReducer::new().reduce(&indicators, 100.0);
        assert!(record.rationale.contains("overbought"));
        assert!(matches!(record.label, SignalLabel::Sell | SignalLabel::StrongSell));
    }

    #[test]
    fn test_missing_required_indicator_fails_closed() {
        let mut indicators = IndicatorResult::new();
        indicators.insert("MA5", IndicatorValue::Line { values: vec![Some(1.0)] });
        let record = SignalReducer::new().reduce(&indicators, 100.0);
        assert_eq!(record.label, SignalLabel::Error);
        assert_eq!(record.strength, 0.0);
        assert_eq!(record.recommendation, Recommendation::Hold);
        assert!(record.rationale.contains("MACD"));
    }

    #[test]
    fn test_non_finite_price_fails_closed() {
        let indicators = mapping(vec![0.1], 50.0, 50.0, None, None);
        let record = SignalReducer::new().reduce(&indicators, f64::NAN);
        assert_eq!(record.label, SignalLabel::Error);
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let indicators = mapping(vec![0.1, 0.2, -0.3], 30.0, 45.0, Some(99.0), Some((3.0, 3.0)));
        let reducer = SignalReducer::new();
        let a = reducer.reduce(&indicators, 100.0);
        let b = reducer.reduce(&indicators, 100.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(label_for_score(0.6), SignalLabel::StrongBuy);
        assert_eq!(label_for_score(0.2), SignalLabel::Buy);
        assert_eq!(label_for_score(0.0), SignalLabel::Hold);
        assert_eq!(label_for_score(-0.2), SignalLabel::Sell);
        assert_eq!(label_for_score(-0.6), SignalLabel::StrongSell);
        assert_eq!(strength_for_score(0.0), 0.5);
        assert_eq!(strength_for_score(-1.0), 1.0);
    }
}
