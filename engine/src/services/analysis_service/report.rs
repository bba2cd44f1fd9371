// Console rendering of a finished analysis
use shared::models::{CurrencyAnalysis, Series};
use shared::utils::{format_percent, format_usd};
use std::fmt::Write;

const WIDTH: usize = 50;

fn last_value(series: &Series) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

pub fn render_analysis(analysis: &CurrencyAnalysis) -> String {
    let rule = "=".repeat(WIDTH);
    let technical = &analysis.technical;
    let signal = &technical.signal;
    let indicators = &technical.indicators;
    let change_icon = if analysis.quote.change_24h > 0.0 { "📈" } else { "📉" };

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "📊 {} ({}) analysis report", analysis.name, analysis.symbol);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "💰 Price: {}", format_usd(analysis.quote.price));
    let _ = writeln!(out, "{} 24h change: {}", change_icon, format_percent(analysis.quote.change_24h));

    for (period, series) in indicators.moving_averages() {
        let _ = writeln!(out, "   MA{:<4} {}", period, fmt_opt(last_value(series)));
    }
    if let Some(macd) = indicators.macd() {
        let _ = writeln!(
            out,
            "   MACD   line {} / signal {} / hist {}",
            fmt_opt(macd.line.last().copied()),
            fmt_opt(macd.signal.last().copied()),
            fmt_opt(macd.histogram.last().copied())
        );
    }
    if let Some(kdj) = indicators.kdj() {
        let _ = writeln!(
            out,
            "   KDJ    K {} / D {} / J {}",
            fmt_opt(kdj.k.last().copied()),
            fmt_opt(kdj.d.last().copied()),
            fmt_opt(kdj.j.last().copied())
        );
    }
    if let Some(skdj) = indicators.skdj() {
        let _ = writeln!(
            out,
            "   SKDJ   K {} / D {} / J {}",
            fmt_opt(last_value(&skdj.sk)),
            fmt_opt(last_value(&skdj.sd)),
            fmt_opt(last_value(&skdj.sj))
        );
    }
    if let Some(obv) = indicators.line("OBV") {
        let _ = writeln!(out, "   OBV    {}", fmt_opt(last_value(obv)));
    }

    let _ = writeln!(out, "🎯 Signal: {} (strength {:.0}%)", signal.label, signal.strength * 100.0);
    let _ = writeln!(out, "💡 Recommendation: {}", signal.recommendation);
    let _ = writeln!(out, "📝 Rationale: {}", signal.rationale);
    let _ = writeln!(
        out,
        "⏰ Analysed: {} ({} data points)",
        technical.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        technical.data_points
    );
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "⚠️  For reference only, not trading advice.");
    let _ = write!(out, "{}", rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis_service::tests::{test_service, write_history};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_render_contains_signal_and_indicators() {
        let dir = tempdir().unwrap();
        let closes: Vec<f64> = (0..60).map(|i| 1000.0 + 10.0 * i as f64).collect();
        write_history(dir.path(), "bitcoin", &closes);
        let service = test_service(&dir);
        let analysis = service.analyze_currency("BTC").await.unwrap();

        let text = render_analysis(&analysis);
        assert!(text.contains("Bitcoin (BTC) analysis report"));
        assert!(text.contains("$1,590.00"));
        assert!(text.contains("MA5"));
        assert!(text.contains("MA180  n/a"));
        assert!(text.contains("MACD"));
        assert!(text.contains(&format!("Signal: {}", analysis.technical.signal.label)));
    }

    #[test]
    fn test_last_value_skips_undefined() {
        assert_eq!(last_value(&vec![Some(1.0), Some(2.0), None]), Some(2.0));
        assert_eq!(last_value(&vec![None, None]), None);
    }
}
