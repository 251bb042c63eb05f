//! Euro amounts as they appear in sheets, APIs and chat replies.

use serde::{Deserialize, Deserializer};

/// 解析 "€1,234.50" 之類的儲存格；無法解析時回傳 None
pub fn parse_eur(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '€' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Two decimals with thousands separators, no currency sign: `1,234.50`.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let negative = cents < 0;
    let cents = cents.abs();
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}.{:02}", grouped, frac)
    } else {
        format!("{}.{:02}", grouped, frac)
    }
}

pub fn format_eur(amount: f64) -> String {
    format!("€{}", format_amount(amount))
}

/// Accepts `"12.50"`, `12.5` or null. Shopify sends strings, Flour Cloud numbers.
pub fn de_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_as_f64).unwrap_or(0.0))
}

/// Same as [`de_amount`] for integer quantities.
pub fn de_quantity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(|v| value_as_f64(v) as i64).unwrap_or(0))
}

pub fn value_as_f64(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => parse_eur(s).unwrap_or(0.0),
        _ => 0.0,
    }
}
