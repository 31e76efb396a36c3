//! Donation amount handling.
//!
//! Przelewy24 wants amounts in grosze (minor units). Donors type amounts in
//! złoty with up to two decimal places. The conversion must be exact, so the
//! decimal string is parsed with integer arithmetic only - no `f64` math.

use serde::{Deserialize, Deserializer};

/// 1 PLN - smallest accepted donation.
pub const MIN_AMOUNT_GROSZE: i64 = 100;
/// 50 000 PLN - largest accepted donation.
pub const MAX_AMOUNT_GROSZE: i64 = 5_000_000;

/// Parse a major-unit decimal string ("10.50", "10.1", "10") into grosze.
///
/// Accepts at most two decimal places. Rejects signs, empty parts and any
/// non-digit character so that "1e3" or "-5" never sneak through.
pub fn parse_major_amount(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid amount: {}", raw));
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "amount must have at most two decimal places: {}",
            raw
        ));
    }

    let whole: i64 = whole
        .parse()
        .map_err(|_| format!("amount out of range: {}", raw))?;

    let frac_grosze = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().unwrap_or(0) * 10,
        _ => frac.parse::<i64>().unwrap_or(0),
    };

    whole
        .checked_mul(100)
        .and_then(|g| g.checked_add(frac_grosze))
        .ok_or_else(|| format!("amount out of range: {}", raw))
}

/// True when the amount is inside the accepted donation range.
pub fn in_bounds(grosze: i64) -> bool {
    (MIN_AMOUNT_GROSZE..=MAX_AMOUNT_GROSZE).contains(&grosze)
}

/// Render grosze back as a major-unit string for user-facing URLs.
/// Whole amounts drop the fraction: 2500 -> "25", 2505 -> "25.05".
pub fn format_major(grosze: i64) -> String {
    if grosze % 100 == 0 {
        format!("{}", grosze / 100)
    } else {
        format!("{}.{:02}", grosze / 100, grosze % 100)
    }
}

/// Serde helper: deserialize a JSON number or string amount into grosze.
///
/// JSON numbers are re-rendered through `serde_json::Number` (shortest
/// round-trip form, so `10.1` comes back as the literal "10.1") and parsed
/// by [`parse_major_amount`] - the value never flows through float math.
pub fn deserialize_grosze<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let raw = match &value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "amount must be a number or string, got {}",
                other
            )))
        }
    };
    parse_major_amount(&raw).map_err(serde::de::Error::custom)
}
