//! Browser tests (`wasm-pack test --headless --chrome`).

#![cfg(target_arch = "wasm32")]

use booking_wasm::{convert_currency, format_currency, PaymentWidget};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_exports_in_browser() {
    let eur = convert_currency(1499.0, "USD", "EUR");
    assert_eq!(format_currency(eur, "EUR"), "€1,379.08");
}

#[wasm_bindgen_test]
fn test_widget_without_return_params() {
    let widget = PaymentWidget::new("http://localhost:4000/api".into(), None);
    assert_eq!(widget.on_page_load(), None);
    assert_eq!(widget.display_price(1499.0, "GBP"), "£1,184.21");
}
