// Display helpers shared by the report sinks.

/// Formats a dollar amount with thousands separators, e.g. `$67,012.35`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return format!("${}", value);
    }
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}

/// Signed percentage with two decimals, e.g. `+1.25%` / `-0.40%`.
pub fn format_percent(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}
