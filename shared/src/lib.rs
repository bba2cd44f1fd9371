pub mod models;
pub mod utils;

#[cfg(test)]
mod tests {
    use crate::models::*;

    #[test]
    fn test_from_closes_synthesizes_parallel_lists() {
        let series = PriceSeries::from_closes(vec![1.0, 2.0, 3.0]);
        assert_eq!(series.high, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.low, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.volumes, vec![0.0; 3]);
        assert_eq!(series.last_price(), Some(3.0));
    }

    #[test]
    fn test_moving_averages_sorted_by_period() {
        let mut result = IndicatorResult::new();
        result.insert("MA48", IndicatorValue::Line { values: vec![None] });
        result.insert("MA5", IndicatorValue::Line { values: vec![Some(1.0)] });
        result.insert("OBV", IndicatorValue::Line { values: vec![Some(0.0)] });
        let periods: Vec<usize> = result.moving_averages().iter().map(|(p, _)| *p).collect();
        assert_eq!(periods, vec![5, 48]);
    }

    #[test]
    fn test_label_maps_to_recommendation() {
        assert_eq!(SignalLabel::StrongBuy.recommendation(), Recommendation::Buy);
        assert_eq!(SignalLabel::Sell.recommendation(), Recommendation::Sell);
        assert_eq!(SignalLabel::Error.recommendation(), Recommendation::Hold);
        assert_eq!(serde_json::to_string(&SignalLabel::StrongSell).unwrap(), "\"strong-sell\"");
    }
}
