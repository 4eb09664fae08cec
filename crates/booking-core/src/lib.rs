//! # booking-core
//!
//! Core types and traits for the travel-checkout booking flow.
//!
//! This crate provides:
//! - `RateTable` and the currency formatting / minor-unit helpers
//! - `Package` and `PackageCatalog` for bookable travel packages
//! - `CheckoutRequest`, `CheckoutSession`, `SessionDetails` for checkout
//! - `PricingPolicy` for the authoritative server-side charge
//! - `RedirectUrls` and `PaymentReturn` for the redirect query contract
//! - `PaymentProvider` trait implemented by provider crates
//! - `WebhookEvent` and the `EventLedger` idempotency store
//! - `PreferenceStore` for the buyer's persisted currency choice
//! - `BookingError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use booking_core::{CheckoutRequest, CheckoutSessionParams, PricingPolicy, RedirectUrls};
//!
//! let checkout = CheckoutRequest::new("7", "Bali Escape", 1379.08)
//!     .with_currency("EUR")
//!     .validate()?;
//!
//! let charge = policy.charge_for(&checkout)?;
//! let params = CheckoutSessionParams::new(&checkout, charge.amount, &charge.currency, &urls);
//!
//! let session = provider.create_checkout_session(&params).await?;
//! // Redirect the buyer to session.url
//! ```

pub mod checkout;
pub mod currency;
pub mod error;
pub mod events;
pub mod package;
pub mod preferences;
pub mod pricing;
pub mod provider;
pub mod redirect;

// Re-exports for convenience
pub use checkout::{
    BookingMetadata, CheckoutRequest, CheckoutSession, CheckoutSessionParams, SessionDetails,
    SessionStatus, ValidatedCheckout,
};
pub use currency::{
    decimal_places, format_currency, from_minor_units, from_smallest_unit, round_for_currency,
    round_to_cents, to_minor_units, to_smallest_unit, RateTable, DEFAULT_BASE_CURRENCY,
};
pub use error::{BookingError, BookingResult};
pub use events::{
    Delivery, EventLedger, InMemoryEventLedger, SessionObject, WebhookEvent, WebhookEventType,
};
pub use package::{Package, PackageCatalog};
pub use preferences::{CurrencyPreference, MemoryPreferenceStore, PreferenceStore};
pub use pricing::{Charge, PriceSource, PricingPolicy};
pub use provider::{BoxedPaymentProvider, PaymentProvider};
pub use redirect::{strip_payment_params, PaymentReturn, RedirectUrls};
