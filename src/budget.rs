//! Reading the investable budget from user text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

// "$1,000,000.50", "25000", "2.5k", "$1m"
static MONEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|\.\d+)\s*([kKmMbB])?$")
        .expect("budget pattern is a valid regex")
});

/// A budget must be a positive, finite amount.
pub fn validate_budget(budget: f64) -> Result<f64, ValidationError> {
    if budget.is_finite() && budget > 0.0 {
        Ok(budget)
    } else {
        Err(ValidationError::NonPositiveBudget(budget))
    }
}

/// Parse a budget such as `10000`, `$1,000,000.50` or `2.5k`.
pub fn parse_budget(text: &str) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    let caps = MONEY_RE
        .captures(trimmed)
        .ok_or_else(|| ValidationError::UnparsableBudget(trimmed.to_string()))?;

    let amount: f64 = caps[1]
        .replace(',', "")
        .parse()
        .map_err(|_| ValidationError::UnparsableBudget(trimmed.to_string()))?;

    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(suffix) if suffix == "k" => 1e3,
        Some(suffix) if suffix == "m" => 1e6,
        Some(suffix) if suffix == "b" => 1e9,
        _ => 1.0,
    };

    validate_budget(amount * multiplier)
}
