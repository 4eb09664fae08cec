//! # Buyer Preferences
//!
//! Key-value preference storage behind a trait, so the browser can back it
//! with `localStorage` and tests with a map.

use crate::currency::{normalize_code, RateTable};
use std::cell::RefCell;
use std::collections::HashMap;

/// Storage key for the selected display/checkout currency
pub const PREFERRED_CURRENCY_KEY: &str = "preferredCurrency";

/// String key-value storage
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store (tests, non-browser hosts)
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

/// Reads and writes the buyer's currency choice
pub struct CurrencyPreference<'a, S: PreferenceStore + ?Sized> {
    store: &'a S,
    rates: &'a RateTable,
}

impl<'a, S: PreferenceStore + ?Sized> CurrencyPreference<'a, S> {
    pub fn new(store: &'a S, rates: &'a RateTable) -> Self {
        Self { store, rates }
    }

    /// Stored currency, or the base currency when absent or unsupported
    pub fn current(&self) -> String {
        self.store
            .get(PREFERRED_CURRENCY_KEY)
            .map(|code| normalize_code(&code))
            .filter(|code| self.rates.supports(code))
            .unwrap_or_else(|| self.rates.base().to_string())
    }

    /// Persist a choice; unsupported codes are ignored and `false` returned
    pub fn select(&self, code: &str) -> bool {
        let code = normalize_code(code);
        if !self.rates.supports(&code) {
            return false;
        }
        self.store.set(PREFERRED_CURRENCY_KEY, &code);
        true
    }
}
