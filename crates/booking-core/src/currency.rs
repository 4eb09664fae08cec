//! # Currency Conversion
//!
//! Static exchange-rate table anchored to one base currency, plus the
//! display formatting and minor-unit helpers used by checkout.
//!
//! The table is an explicit value: build it once (defaults or
//! `config/packages.toml`) and hand it to whoever converts. It is never
//! mutated after construction.

use crate::error::BookingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base currency every rate is expressed against
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Default multipliers relative to USD
const DEFAULT_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.50),
    ("AUD", 1.52),
    ("CAD", 1.36),
];

/// Currency code normalization (ISO 4217 codes are upper-case)
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Exchange-rate table: currency code -> multiplier relative to `base`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRateTable")]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RawRateTable {
    #[serde(default = "default_base")]
    base: String,
    rates: BTreeMap<String, f64>,
}

fn default_base() -> String {
    DEFAULT_BASE_CURRENCY.to_string()
}

impl TryFrom<RawRateTable> for RateTable {
    type Error = BookingError;

    fn try_from(raw: RawRateTable) -> Result<Self, Self::Error> {
        let mut table = RateTable::empty(&raw.base);
        for (code, rate) in raw.rates {
            table = table.with_rate(&code, rate)?;
        }
        Ok(table)
    }
}

impl RateTable {
    /// Table containing only the base currency (rate 1)
    pub fn empty(base: &str) -> Self {
        let base = normalize_code(base);
        let mut rates = BTreeMap::new();
        rates.insert(base.clone(), 1.0);
        Self { base, rates }
    }

    /// Builder: add or replace a rate
    pub fn with_rate(mut self, code: &str, rate: f64) -> Result<Self, BookingError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(BookingError::InvalidRequest(
                "currency code must not be empty".to_string(),
            ));
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(BookingError::InvalidRequest(format!(
                "rate for {} must be a positive number, got {}",
                code, rate
            )));
        }
        if code == self.base && rate != 1.0 {
            return Err(BookingError::InvalidRequest(format!(
                "base currency {} must have rate 1",
                code
            )));
        }
        self.rates.insert(code, rate);
        Ok(self)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Multiplier for a currency, if supported
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&normalize_code(code)).copied()
    }

    pub fn supports(&self, code: &str) -> bool {
        self.rate(code).is_some()
    }

    /// Supported codes in alphabetical order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.rates
    }

    /// Convert `amount` from one currency to another via the base currency.
    ///
    /// Unknown codes are not an error: the input amount is returned unchanged
    /// so a widget never blocks on a bad selection.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        let (from, to) = (normalize_code(from), normalize_code(to));
        if from == to {
            return amount;
        }
        match (self.rates.get(&from), self.rates.get(&to)) {
            (Some(from_rate), Some(to_rate)) => amount / from_rate * to_rate,
            _ => amount,
        }
    }

    /// Convert a base-currency price into `to`
    pub fn from_base(&self, amount: f64, to: &str) -> f64 {
        self.convert(amount, &self.base, to)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_CURRENCY.to_string(),
            rates: DEFAULT_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        }
    }
}

/// Convert a major-unit amount to minor units (×100, half away from zero).
///
/// The scaled value is first snapped to 1e-6 so representation noise such
/// as `1999.4999999999998` still rounds to `2000`.
pub fn to_minor_units(amount: f64) -> i64 {
    let scaled = amount * 100.0;
    let snapped = (scaled * 1_000_000.0).round() / 1_000_000.0;
    snapped.round() as i64
}

/// Convert minor units back to a major-unit amount
pub fn from_minor_units(amount: i64) -> f64 {
    amount as f64 / 100.0
}

/// Round a major-unit amount to two decimals
pub fn round_to_cents(amount: f64) -> f64 {
    from_minor_units(to_minor_units(amount))
}

/// Zero-decimal ISO 4217 codes supported by card providers
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

/// Decimal places of the currency's smallest unit, as charged by providers
/// (JPY has 0, most others have 2). Display formatting ignores this.
pub fn decimal_places(code: &str) -> u32 {
    if ZERO_DECIMAL_CURRENCIES.contains(&normalize_code(code).as_str()) {
        0
    } else {
        2
    }
}

/// Convert a major-unit amount to the currency's smallest unit
pub fn to_smallest_unit(amount: f64, code: &str) -> i64 {
    match decimal_places(code) {
        0 => {
            let snapped = (amount * 1_000_000.0).round() / 1_000_000.0;
            snapped.round() as i64
        }
        _ => to_minor_units(amount),
    }
}

/// Convert from the currency's smallest unit back to major units
pub fn from_smallest_unit(amount: i64, code: &str) -> f64 {
    match decimal_places(code) {
        0 => amount as f64,
        _ => from_minor_units(amount),
    }
}

/// Round a major-unit amount to what the currency can actually be charged in
pub fn round_for_currency(amount: f64, code: &str) -> f64 {
    from_smallest_unit(to_smallest_unit(amount, code), code)
}

fn symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "AUD" => Some("A$"),
        "CAD" => Some("CA$"),
        _ => None,
    }
}

fn group_thousands(mut whole: i64) -> String {
    let mut groups = Vec::new();
    loop {
        if whole < 1000 {
            groups.push(whole.to_string());
            break;
        }
        groups.push(format!("{:03}", whole % 1000));
        whole /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

/// Format an amount as an en-US currency string with exactly two decimals.
///
/// Every code is rendered with two fractional digits, JPY included; the rate
/// table treats all currencies as two-decimal for display consistency.
pub fn format_currency(amount: f64, code: &str) -> String {
    let code = normalize_code(code);
    let cents = to_minor_units(amount.abs());
    let sign = if amount < 0.0 && cents != 0 { "-" } else { "" };
    let number = format!("{}.{:02}", group_thousands(cents / 100), cents % 100);

    match symbol(&code) {
        Some(sym) => format!("{}{}{}", sign, sym, number),
        None => format!("{}{} {}", sign, code, number),
    }
}
