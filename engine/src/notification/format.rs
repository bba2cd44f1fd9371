// Message bodies shared by every notification channel
use chrono::{DateTime, Utc};
use shared::models::{CurrencyAnalysis, PriceQuote, SignalLabel};
use shared::utils::{format_percent, format_usd};

const RULE: &str = "────────────────";
const FOOTER: &str = "crypto-signal";

/// Output flavour: Telegram accepts a small HTML subset, the console gets plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Html,
    Plain,
}

impl Markup {
    fn bold(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<b>{}</b>", escape_html(text)),
            Markup::Plain => text.to_string(),
        }
    }

    fn text(self, text: &str) -> String {
        match self {
            Markup::Html => escape_html(text),
            Markup::Plain => text.to_string(),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn signal_icons(label: SignalLabel) -> (&'static str, &'static str) {
    match label {
        SignalLabel::StrongBuy => ("🚀", "🟢"),
        SignalLabel::Buy => ("📈", "🟢"),
        SignalLabel::Sell => ("📉", "🔴"),
        SignalLabel::StrongSell => ("⚠️", "🔴"),
        SignalLabel::Hold | SignalLabel::Error => ("📊", "🟡"),
    }
}

pub fn price_alert(symbol: &str, quote: &PriceQuote, markup: Markup, at: DateTime<Utc>) -> String {
    let icon = if quote.change_24h > 0.0 { "📈" } else { "📉" };
    [
        format!("{} {}", icon, markup.bold(&format!("{} price alert", symbol))),
        RULE.to_string(),
        format!("💰 Price: {}", markup.bold(&format_usd(quote.price))),
        format!("📊 24h change: {}", markup.bold(&format_percent(quote.change_24h))),
        format!("⏰ Updated: {}", timestamp(at)),
        RULE.to_string(),
        FOOTER.to_string(),
    ]
    .join("\n")
}

pub fn analysis_report(analysis: &CurrencyAnalysis, markup: Markup, at: DateTime<Utc>) -> String {
    let signal = &analysis.technical.signal;
    let (icon, dot) = signal_icons(signal.label);
    [
        format!(
            "{} {}",
            icon,
            markup.bold(&format!("{} technical analysis", analysis.symbol))
        ),
        RULE.to_string(),
        format!(
            "💰 Price: {}",
            markup.bold(&format_usd(analysis.technical.current_price))
        ),
        format!(
            "{} Signal: {} (strength {:.0}%)",
            dot,
            markup.bold(signal.label.as_str()),
            signal.strength * 100.0
        ),
        format!(
            "🎯 Recommendation: {}",
            markup.bold(&signal.recommendation.to_string())
        ),
        format!("📝 Rationale: {}", markup.text(&signal.rationale)),
        format!("⏰ Analysed: {}", timestamp(at)),
        RULE.to_string(),
        FOOTER.to_string(),
        markup.bold("⚠️ For reference only, not trading advice."),
    ]
    .join("\n")
}

pub fn error_alert(error: &str, context: &str, markup: Markup, at: DateTime<Utc>) -> String {
    [
        format!("⚠️ {}", markup.bold("Error alert")),
        RULE.to_string(),
        format!("❌ Error: {}", markup.bold(error)),
        format!("📋 Context: {}", markup.text(context)),
        format!("⏰ Occurred: {}", timestamp(at)),
        RULE.to_string(),
        FOOTER.to_string(),
    ]
    .join("\n")
}

pub fn connection_test(channel: &str, markup: Markup, at: DateTime<Utc>) -> String {
    [
        format!("✅ {}", markup.bold("Connection test succeeded")),
        RULE.to_string(),
        format!("📱 Channel: {}", markup.text(channel)),
        format!("⏰ Tested: {}", timestamp(at)),
        RULE.to_string(),
        FOOTER.to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_price_alert_html() {
        let quote = PriceQuote {
            price: 67012.5,
            change_24h: 3.25,
            ..Default::default()
        };
        let msg = price_alert("BTC", &quote, Markup::Html, at());
        assert!(msg.starts_with("📈 <b>BTC price alert</b>"));
        assert!(msg.contains("<b>$67,012.50</b>"));
        assert!(msg.contains("<b>+3.25%</b>"));
        assert!(msg.contains("2024-06-01 12:00:00 UTC"));
    }

    #[test]
    fn test_price_alert_plain_falling() {
        let quote = PriceQuote {
            price: 1.0,
            change_24h: -0.5,
            ..Default::default()
        };
        let msg = price_alert("DOGE", &quote, Markup::Plain, at());
        assert!(msg.starts_with("📉 DOGE price alert"));
        assert!(!msg.contains("<b>"));
    }

    #[test]
    fn test_error_alert_escapes_html() {
        let msg = error_alert("HTTP <500>", "a & b", Markup::Html, at());
        assert!(msg.contains("<b>HTTP &lt;500&gt;</b>"));
        assert!(msg.contains("a &amp; b"));
    }

    #[test]
    fn test_connection_test_message() {
        let msg = connection_test("telegram", Markup::Plain, at());
        assert!(msg.contains("Connection test succeeded"));
        assert!(msg.contains("Channel: telegram"));
    }
}
