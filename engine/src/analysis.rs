// Core analysis pipeline: price series -> indicator mapping -> signal record
use crate::error::{EngineError, Result};
use crate::indicators::IndicatorEngine;
use crate::signals::SignalReducer;
use chrono::Utc;
use shared::models::{PriceSeries, TechnicalAnalysis};

/// Runs the indicator engine and the signal reducer over `series`.
///
/// The current price is the last sample of the series.
pub fn analyze_series(
    engine: &IndicatorEngine,
    reducer: &SignalReducer,
    series: &PriceSeries,
) -> Result<TechnicalAnalysis> {
    let indicators = engine.compute(series)?;
    let current_price = series
        .last_price()
        .ok_or_else(|| EngineError::InsufficientData("price series is empty".to_string()))?;
    let signal = reducer.reduce(&indicators, current_price);

    tracing::info!(
        data_points = series.len(),
        current_price,
        signal = %signal.label,
        strength = signal.strength,
        "Technical analysis complete"
    );

    Ok(TechnicalAnalysis {
        current_price,
        data_points: series.len(),
        indicators,
        signal,
        analyzed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorParameters;
    use shared::models::SignalLabel;

    #[test]
    fn test_analyze_series_produces_signal() {
        let engine = IndicatorEngine::new(IndicatorParameters::default()).unwrap();
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = PriceSeries::from_closes(prices);
        let analysis = analyze_series(&engine, &SignalReducer::new(), &series).unwrap();
        assert_eq!(analysis.current_price, 159.0);
        assert_eq!(analysis.data_points, 60);
        assert_ne!(analysis.signal.label, SignalLabel::Error);
        assert!(analysis.indicators.contains("MA5"));
    }

    #[test]
    fn test_analyze_empty_series_errors() {
        let engine = IndicatorEngine::new(IndicatorParameters::default()).unwrap();
        let err = analyze_series(&engine, &SignalReducer::new(), &PriceSeries::default()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData(_)));
    }

    #[test]
    fn test_disabled_required_indicator_yields_error_label() {
        let mut params = IndicatorParameters::default();
        params.kdj = None;
        let engine = IndicatorEngine::new(params).unwrap();
        let series = PriceSeries::from_closes(vec![1.0, 2.0, 3.0]);
        let analysis = analyze_series(&engine, &SignalReducer::new(), &series).unwrap();
        assert_eq!(analysis.signal.label, SignalLabel::Error);
        assert!(analysis.signal.rationale.contains("KDJ"));
    }
}
