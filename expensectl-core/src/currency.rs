//! Currency display and fixed-rate conversion

use crate::models::Money;

/// Static description of a supported currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_CURRENCY: &str = "USD";

pub const CURRENCIES: [CurrencyInfo; 2] = [
    CurrencyInfo {
        code: "USD",
        symbol: "$",
        name: "US Dollar",
    },
    CurrencyInfo {
        code: "INR",
        symbol: "₹",
        name: "Indian Rupee",
    },
];

/// (from, to, rate) for the fixed conversion table
const CONVERSION_RATES: [(&str, &str, f64); 2] = [("USD", "INR", 83.5), ("INR", "USD", 0.012)];

pub fn lookup(code: &str) -> Option<&'static CurrencyInfo> {
    CURRENCIES.iter().find(|c| c.code == code)
}

/// `$25.50` for known currencies, `25.50 EUR` otherwise
pub fn format_currency(amount: Money, code: &str) -> String {
    match lookup(code) {
        Some(info) => format!("{}{}", info.symbol, amount),
        None => format!("{} {}", amount, code),
    }
}

pub fn currency_symbol(code: &str) -> &str {
    lookup(code).map(|c| c.symbol).unwrap_or(code)
}

pub fn currency_name(code: &str) -> &str {
    lookup(code).map(|c| c.name).unwrap_or(code)
}

/// Convert using the fixed table. Unknown pairs are returned unchanged.
pub fn convert(amount: Money, from: &str, to: &str) -> Money {
    if from == to {
        return amount;
    }
    CONVERSION_RATES
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, rate)| amount.scale(*rate))
        .unwrap_or(amount)
}
