// Indicator engine: runs every enabled indicator family over one series
use super::{IndicatorCalculator, IndicatorParameters, Kdj, Ma, Macd, Obv, Skdj};
use crate::error::{EngineError, Result};
use shared::models::{IndicatorResult, PriceSeries};

pub struct IndicatorEngine {
    parameters: IndicatorParameters,
    calculators: Vec<Box<dyn IndicatorCalculator>>,
}

impl IndicatorEngine {
    /// Validates `parameters` once; a zero window fails here rather than at compute time.
    pub fn new(parameters: IndicatorParameters) -> Result<Self> {
        parameters.validate()?;

        let mut calculators: Vec<Box<dyn IndicatorCalculator>> = Vec::new();
        if let Some(periods) = &parameters.ma_periods {
            for &period in periods {
                calculators.push(Box::new(Ma::new(period)));
            }
        }
        if let Some(params) = parameters.macd {
            calculators.push(Box::new(Macd::new(params)));
        }
        if let Some(params) = parameters.kdj {
            calculators.push(Box::new(Kdj::new(params)));
        }
        if let Some(params) = parameters.skdj {
            calculators.push(Box::new(Skdj::new(params)));
        }
        if let Some(period) = parameters.obv_period {
            calculators.push(Box::new(Obv::new(period)));
        }

        tracing::debug!(
            indicators = ?calculators.iter().map(|c| c.key()).collect::<Vec<_>>(),
            "Indicator engine configured"
        );
        Ok(IndicatorEngine {
            parameters,
            calculators,
        })
    }

    pub fn parameters(&self) -> &IndicatorParameters {
        &self.parameters
    }

    /// Keys produced by [`compute`](Self::compute), in evaluation order.
    pub fn indicator_keys(&self) -> Vec<&str> {
        self.calculators.iter().map(|c| c.key()).collect()
    }

    pub fn compute(&self, series: &PriceSeries) -> Result<IndicatorResult> {
        validate_series(series)?;

        let mut result = IndicatorResult::new();
        for calculator in &self.calculators {
            let value = calculator.calculate(series);
            debug_assert_eq!(value.len(), series.len());
            tracing::trace!(
                indicator = calculator.key(),
                parameters = %calculator.parameters(),
                "Indicator calculated"
            );
            result.insert(calculator.key(), value);
        }
        Ok(result)
    }
}

fn validate_series(series: &PriceSeries) -> Result<()> {
    if series.prices.is_empty() {
        return Err(EngineError::InsufficientData(
            "price series is empty".to_string(),
        ));
    }
    let n = series.prices.len();
    for (name, len) in [
        ("high", series.high.len()),
        ("low", series.low.len()),
        ("volume", series.volumes.len()),
    ] {
        if len != n {
            return Err(EngineError::InvalidParameter(format!(
                "{} series has {} samples but price series has {}",
                name, len, n
            )));
        }
    }
    Ok(())
}
