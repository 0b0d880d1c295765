//! Price text parsing.

use regex_lite::Regex;
use std::sync::LazyLock;

/// First run of digits with an optional 1-2 digit fraction.
static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d{1,2})?)").unwrap());

/// Extracts a price from free-form currency text like "$1,234.50".
///
/// Thousands separators and `$` are stripped before matching. Returns `None`
/// for empty, whitespace-only or non-numeric text; never fails.
pub fn parse_price_value(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }

    let cleaned = text.replace([',', '$'], "");
    let cleaned = cleaned.trim();

    PRICE_NUMBER
        .captures(cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
