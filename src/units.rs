use serde::{Deserialize, Serialize};

/// A chain balance scaled by the network's decimal precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBalance {
    pub value: f64,
    pub unit: String,
}

impl NormalizedBalance {
    pub fn zero(unit: &str) -> Self {
        Self {
            value: 0.0,
            unit: unit.to_string(),
        }
    }
}

/// Normalizes a human-readable ledger amount such as `"1,000 DOT"`.
///
/// Thousands separators are stripped before parsing and the result is divided
/// by `10^decimals`. Never-staked accounts come back from the ledger API with
/// empty or partial amounts, so anything that does not parse is treated as
/// zero. The unit falls back to `native_token` when the source supplies none.
pub fn normalize_balance(raw: &str, decimals: u32, native_token: &str) -> NormalizedBalance {
    let mut parts = raw.split_whitespace();
    let amount = parts.next().map(parse_amount).unwrap_or(0.0);
    let unit = parts
        .next()
        .filter(|unit| !unit.is_empty())
        .unwrap_or(native_token);

    NormalizedBalance {
        value: to_unit(amount, decimals),
        unit: unit.to_string(),
    }
}

/// Parses the numeric part of a ledger amount; malformed input yields zero.
pub fn parse_amount(amount: &str) -> f64 {
    let cleaned: String = amount.chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// Scales a chain-native integer amount down by `10^decimals`.
pub fn to_unit(amount: f64, decimals: u32) -> f64 {
    let exponent = i32::try_from(decimals).unwrap_or(i32::MAX);
    amount / 10f64.powi(exponent)
}

/// Renders a normalized value as a plain decimal string (`"0"`, `"0.0000001"`).
pub fn format_balance(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    value.to_string()
}
