//! Property tests for the indicator engine and the signal reducer.
//!
//! Uses proptest to verify:
//! 1. MA shape: length n, p-1 undefined entries, window means elsewhere
//! 2. MACD has no gaps
//! 3. KDJ identity J = 3K - 2D and the neutral prefix
//! 4. OBV follows the direction of monotone price series
//! 5. SKDJ equals the moving averages of the KDJ lines
//! 6. Reducer determinism and strength/label consistency

use proptest::prelude::*;
use shared::models::{PriceSeries, SignalLabel};
use signal_engine::indicators::kdj::{kdj, NEUTRAL};
use signal_engine::indicators::macd::macd;
use signal_engine::indicators::obv::{obv, on_balance_volume};
use signal_engine::indicators::skdj::skdj;
use signal_engine::indicators::sma::moving_average;
use signal_engine::indicators::IndicatorParameters;
use signal_engine::{EngineError, IndicatorEngine, SignalReducer};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_prices(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, 1..max_len)
}

/// Closes with high/low bracketing them and non-negative volume.
fn arb_ohlcv(max_len: usize) -> impl Strategy<Value = PriceSeries> {
    prop::collection::vec((1.0..1000.0_f64, 0.0..50.0_f64, 0.0..50.0_f64, 0.0..1e6_f64), 1..max_len)
        .prop_map(|rows| PriceSeries {
            prices: rows.iter().map(|r| r.0).collect(),
            high: rows.iter().map(|r| r.0 + r.1).collect(),
            low: rows.iter().map(|r| (r.0 - r.2).max(0.01)).collect(),
            volumes: rows.iter().map(|r| r.3).collect(),
        })
}

fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

// ── 1. Moving average ───────────────────────────────────────────────

proptest! {
    #[test]
    fn ma_shape_and_window_means(prices in arb_prices(120), p in 1usize..30) {
        prop_assume!(p <= prices.len());
        let ma = moving_average(&prices, p);
        prop_assert_eq!(ma.len(), prices.len());
        for (i, value) in ma.iter().enumerate() {
            if i + 1 < p {
                prop_assert!(value.is_none());
            } else {
                let window = &prices[i + 1 - p..=i];
                let mean = window.iter().sum::<f64>() / p as f64;
                prop_assert!(close_enough(value.unwrap(), mean));
            }
        }
    }

    #[test]
    fn ma_longer_than_series_is_all_undefined(prices in arb_prices(20)) {
        let ma = moving_average(&prices, prices.len() + 1);
        prop_assert!(ma.iter().all(Option::is_none));
    }
}

// ── 2. MACD ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn macd_has_no_gaps(prices in arb_prices(200), fast in 1usize..15, extra in 0usize..20, signal in 1usize..12) {
        let out = macd(&prices, fast, fast + extra, signal);
        prop_assert_eq!(out.line.len(), prices.len());
        prop_assert_eq!(out.signal.len(), prices.len());
        prop_assert_eq!(out.histogram.len(), prices.len());
        prop_assert!(out.line.iter().chain(&out.signal).chain(&out.histogram).all(|v| v.is_finite()));
        for i in 0..prices.len() {
            prop_assert!(close_enough(out.histogram[i], out.line[i] - out.signal[i]));
        }
    }
}

// ── 3. KDJ ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn kdj_j_identity_and_neutral_prefix(series in arb_ohlcv(150), period in 1usize..20) {
        let out = kdj(&series.high, &series.low, &series.prices, period);
        prop_assert_eq!(out.k.len(), series.len());
        for i in 0..series.len() {
            prop_assert_eq!(out.j[i], 3.0 * out.k[i] - 2.0 * out.d[i]);
            if i + 1 < period {
                prop_assert_eq!(out.k[i], NEUTRAL);
                prop_assert_eq!(out.d[i], NEUTRAL);
                prop_assert_eq!(out.j[i], NEUTRAL);
            }
        }
    }
}

// ── 4. OBV ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn obv_follows_monotone_prices(
        steps in prop::collection::vec(0.0..5.0_f64, 1..80),
        volumes in prop::collection::vec(0.0..1e4_f64, 80),
        period in 1usize..10,
    ) {
        let mut rising = vec![100.0];
        for s in &steps {
            let last = *rising.last().unwrap();
            rising.push(last + s);
        }
        let falling: Vec<f64> = rising.iter().map(|p| 1000.0 - p).collect();
        let volume = &volumes[..rising.len().min(volumes.len())];
        let rising = &rising[..volume.len()];
        let falling = &falling[..volume.len()];

        let up = on_balance_volume(rising, volume);
        prop_assert!(up.windows(2).all(|w| w[1] >= w[0]));
        let down = on_balance_volume(falling, volume);
        prop_assert!(down.windows(2).all(|w| w[1] <= w[0]));

        let smoothed: Vec<f64> = obv(rising, volume, period).into_iter().flatten().collect();
        prop_assert!(smoothed.windows(2).all(|w| w[1] >= w[0] - 1e-6 * (1.0 + w[0].abs())));
    }
}

// ── 5. SKDJ ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn skdj_is_ma_of_kdj(series in arb_ohlcv(120), period in 1usize..15, k_period in 1usize..6, d_period in 1usize..6) {
        let fast = kdj(&series.high, &series.low, &series.prices, period);
        let slow = skdj(&series.high, &series.low, &series.prices, period, k_period, d_period);
        prop_assert_eq!(slow.sk, moving_average(&fast.k, k_period));
        prop_assert_eq!(slow.sd, moving_average(&fast.d, d_period));
    }
}

// ── 6. Reducer ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn reducer_is_deterministic(series in arb_ohlcv(250)) {
        let engine = IndicatorEngine::new(IndicatorParameters::default()).unwrap();
        let indicators = engine.compute(&series).unwrap();
        let price = series.last_price().unwrap();
        let reducer = SignalReducer::new();

        let first = reducer.reduce(&indicators, price);
        let second = reducer.reduce(&indicators, price);
        prop_assert_eq!(&first, &second);
        prop_assert!((0.0..=1.0).contains(&first.strength));
        prop_assert!(first.label != SignalLabel::Error);
        prop_assert_eq!(first.recommendation, first.label.recommendation());
        prop_assert!(!first.rationale.is_empty());
    }
}

// ── Worked examples ─────────────────────────────────────────────────

#[test]
fn ma_ramp_example() {
    let prices: Vec<f64> = (100..110).map(f64::from).collect();
    let ma = moving_average(&prices, 5);
    assert!(ma[..4].iter().all(Option::is_none));
    assert_eq!(ma[4], Some(102.0));
    assert_eq!(ma[9], Some(107.0));
}

#[test]
fn obv_example() {
    let close = [10.0, 11.0, 10.0, 10.0, 12.0];
    let volume = [0.0, 5.0, 3.0, 3.0, 7.0];
    assert_eq!(on_balance_volume(&close, &volume), vec![0.0, 5.0, 2.0, 2.0, 9.0]);
}

#[test]
fn empty_series_is_insufficient_data() {
    let engine = IndicatorEngine::new(IndicatorParameters::default()).unwrap();
    let err = engine.compute(&PriceSeries::default()).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData(_)));
}
