//! # booking-wasm
//!
//! WebAssembly booking widget for travel-checkout-rs.
//!
//! This crate provides:
//! - Currency conversion and formatting for the page's price displays
//! - `PaymentOrchestrator`, the "Book Now" → hosted checkout → return-trip flow
//! - `PaymentWidget`, the orchestrator wired to `fetch`, `location`,
//!   `history` and `localStorage` (wasm32 only)
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PaymentWidget, convert_currency, format_currency } from 'travel-checkout-wasm';
//!
//! await init();
//!
//! const price = format_currency(convert_currency(1499, 'USD', 'EUR'), 'EUR'); // "€1,379.08"
//!
//! const widget = new PaymentWidget('http://localhost:4000/api', 'paymentStatus');
//! widget.onPageLoad();
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

pub mod orchestrator;

#[cfg(target_arch = "wasm32")]
pub mod bindings;

pub use orchestrator::{
    BookControl, BookOutcome, Browser, CheckoutApi, CheckoutResponse, ClientError, Notifier,
    PaymentOrchestrator, WidgetState,
};

#[cfg(target_arch = "wasm32")]
pub use bindings::PaymentWidget;

use booking_core::RateTable;
use wasm_bindgen::prelude::*;

/// Convert an amount between two currencies with the built-in rates.
///
/// Unknown codes return the amount unchanged.
#[wasm_bindgen]
pub fn convert_currency(amount: f64, from: &str, to: &str) -> f64 {
    RateTable::default().convert(amount, from, to)
}

/// Format an amount for display, e.g. `format_currency(1379.08, "EUR")` → "€1,379.08"
#[wasm_bindgen]
pub fn format_currency(amount: f64, code: &str) -> String {
    booking_core::format_currency(amount, code)
}

/// Major units to minor units (cents), rounding half away from zero
#[wasm_bindgen]
pub fn to_minor_units(amount: f64) -> i64 {
    booking_core::to_minor_units(amount)
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
