//! Display formatting shared by every renderer.
//!
//! Non-finite input never leaks into a label: money renders "$0",
//! percentages "0.0%", rates "0.0000".

const CURRENCY: &str = "$";

/// Abbreviated money: "$1.23m", "$45.6k", "$789", with a leading "-" for
/// negatives.
pub fn format_money(x: f64) -> String {
    if !x.is_finite() {
        return format!("{CURRENCY}0");
    }
    let sign = if x < 0.0 { "-" } else { "" };
    let v = x.abs();
    if v >= 1e6 {
        format!("{sign}{CURRENCY}{:.2}m", v / 1e6)
    } else if v >= 1e3 {
        format!("{sign}{CURRENCY}{:.1}k", v / 1e3)
    } else {
        format!("{sign}{CURRENCY}{v:.0}")
    }
}

/// Money with an explicit "+" on positive values.
pub fn format_signed_money(x: f64) -> String {
    if x.is_finite() && x > 0.0 {
        format!("+{}", format_money(x))
    } else {
        format_money(x)
    }
}

/// A ratio as a percentage with one decimal: 0.1234 → "12.3%".
pub fn format_pct(x: f64) -> String {
    if !x.is_finite() {
        return "0.0%".to_string();
    }
    format!("{:.1}%", x * 100.0)
}

/// Exchange rates: four decimals.
pub fn format_rate(x: f64) -> String {
    if !x.is_finite() {
        return "0.0000".to_string();
    }
    format!("{x:.4}")
}

/// Signed rate delta: "+0.0123" / "-0.0040".
pub fn format_rate_change(x: f64) -> String {
    if x.is_finite() && x > 0.0 {
        format!("+{}", format_rate(x))
    } else {
        format_rate(x)
    }
}

/// Unit prices: "$0.1234".
pub fn format_price(x: f64) -> String {
    format!("{CURRENCY}{}", format_rate(x))
}

/// Integer counts with thousands separators: 1234567 → "1,234,567".
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Count delta with a "+" on gains.
pub fn format_count_change(n: i64) -> String {
    if n > 0 {
        format!("+{}", format_count(n))
    } else {
        format_count(n)
    }
}
