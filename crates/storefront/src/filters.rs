//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a decimal amount as a price, e.g. `59.9` becomes `$59.90`.
///
/// Values that are not decimals are rendered unchanged.
///
/// Usage in templates: `{{ game.price.amount()|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&value.to_string()))
}

fn format_money(raw: &str) -> String {
    raw.trim()
        .parse::<Decimal>()
        .map_or_else(|_| raw.to_owned(), |amount| format!("${:.2}", amount.round_dp(2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("59.9"), "$59.90");
        assert_eq!(format_money("0"), "$0.00");
        assert_eq!(format_money("19.99"), "$19.99");
        assert_eq!(format_money("free"), "free");
    }
}
