// Exponential Moving Average (EMA)

/// EMA seeded from the first sample: `ema[0] = data[0]`, then
/// `ema[i] = (data[i] - ema[i-1]) * 2/(span+1) + ema[i-1]`.
///
/// Unlike an SMA-seeded EMA there is no undefined prefix.
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let multiplier = 2.0 / (span as f64 + 1.0);

    let mut results = Vec::with_capacity(data.len());
    let mut previous_ema = first;
    results.push(previous_ema);

    for &value in data.iter().skip(1) {
        let ema = (value - previous_ema) * multiplier + previous_ema;
        results.push(ema);
        previous_ema = ema;
    }
    results
}
